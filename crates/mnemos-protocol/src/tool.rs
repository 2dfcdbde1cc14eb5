/// Errors returned by tools and tool dispatch.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Tool name is not part of the enabled tool set.
    #[error("tool not found: {0}")]
    ToolNotFound(String),
    /// Tool received invalid arguments.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    /// Tool execution failed.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),
    /// Backing memory store could not be reached.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl ToolError {
    /// Whether the error is an infrastructure fault that must end the turn.
    ///
    /// Everything else is reported back to the model as tool output.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, ToolError::StoreUnavailable(_))
    }
}
