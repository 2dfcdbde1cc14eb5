//! Execution engine for Mnemos.
//!
//! This crate owns the turn graph (load memories, agent, tools), the routing
//! policy, prompt assembly, per-thread transcripts, the chat model interface,
//! and the HTTP providers used by the binary.

pub mod context;
pub mod engine;
pub mod error;
pub mod llm;
pub mod prompt;
pub mod providers;
pub mod routing;
pub mod state;
pub mod threads;

/// Turn engine and its request/response types.
pub use engine::{Engine, EngineBuilder, EngineSettings, TurnRequest, TurnResult};
/// Engine error type.
pub use error::CoreError;
/// Chat model interface.
pub use llm::{ChatModel, ChatRequest, LlmError};
/// Event sink for turn events (re-exported from protocol).
pub use mnemos_protocol::EventSink;
/// Routing policy.
pub use routing::{Route, route};
/// Conversation state for a single turn.
pub use state::ConversationState;
/// Thread transcript storage.
pub use threads::ThreadStore;
/// Cancellation handle accepted by [`Engine::invoke`].
pub use tokio_util::sync::CancellationToken;
