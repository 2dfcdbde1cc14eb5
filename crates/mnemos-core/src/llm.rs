//! Chat model interface.

use async_trait::async_trait;
use mnemos_protocol::Message;
use mnemos_tools::ToolSpec;
use thiserror::Error;

/// Errors returned by chat model providers.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The request could not be sent.
    #[error("model request failed: {0}")]
    Request(String),
    /// The provider answered with a non-success status.
    #[error("model API error {status}: {body}")]
    Api { status: u16, body: String },
    /// The response body could not be decoded.
    #[error("failed to decode model response: {0}")]
    Decode(String),
    /// The response carried no choices.
    #[error("model returned no choices")]
    Empty,
}

/// One model invocation: system prompt, history and bound tools.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system_prompt: String,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolSpec>,
}

/// A language model that can answer with text or tool calls.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Produce the next assistant message.
    async fn chat(&self, request: ChatRequest) -> Result<Message, LlmError>;

    /// Model identifier for logging.
    fn model_name(&self) -> &str;
}
