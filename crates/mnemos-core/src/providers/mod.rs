//! HTTP-backed implementations of the model, embedder and web seams.

mod openai;
mod tavily;

pub use openai::{OpenAiChatModel, OpenAiEmbedder};
pub use tavily::TavilySearchProvider;
