//! Error types for the execution engine.

use crate::llm::LlmError;
use mnemos_memory::MemoryError;
use mnemos_protocol::ToolError;
use thiserror::Error;

/// Errors that end a turn.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The memory store could not be reached.
    #[error("memory store unavailable: {0}")]
    StoreUnavailable(String),
    /// Any other memory failure.
    #[error("memory error: {0}")]
    Memory(MemoryError),
    /// The chat model failed.
    #[error("model error: {0}")]
    Model(#[from] LlmError),
    /// The iteration guard tripped.
    #[error("turn aborted after {iterations} agent iterations")]
    TurnAborted { iterations: usize },
    /// The caller cancelled the turn.
    #[error("turn cancelled")]
    Cancelled,
    /// An external call exceeded its deadline.
    #[error("{operation} timed out after {seconds}s")]
    Timeout {
        operation: &'static str,
        seconds: u64,
    },
    /// A tool failed outside of what can be reported back to the model.
    #[error("tool error: {0}")]
    Tool(ToolError),
}

impl From<MemoryError> for CoreError {
    fn from(err: MemoryError) -> Self {
        if err.is_unavailable() {
            CoreError::StoreUnavailable(err.to_string())
        } else {
            CoreError::Memory(err)
        }
    }
}

impl From<ToolError> for CoreError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::StoreUnavailable(message) => CoreError::StoreUnavailable(message),
            other => CoreError::Tool(other),
        }
    }
}
