//! Handlers for each tool kind.

mod memory;
mod web;

use crate::context::ToolContext;
use crate::invocation::ToolInvocation;
use mnemos_memory::MemoryError;
use mnemos_protocol::ToolError;
use serde_json::Value;

/// What a handler hands back to the model.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Reply {
    /// Normal tool output.
    Value(Value),
    /// In-band rejection; the call ran but did not take effect.
    Rejected(String),
}

/// Run a parsed invocation.
pub(crate) async fn run(ctx: &ToolContext, invocation: ToolInvocation) -> Result<Reply, ToolError> {
    match invocation {
        ToolInvocation::SaveRecallMemory(args) => memory::save_recall_memory(ctx, args).await,
        ToolInvocation::SearchMemory(args) => memory::search_memory(ctx, args).await,
        ToolInvocation::StoreCoreMemory(args) => memory::store_core_memory(ctx, args).await,
        ToolInvocation::WebSearch(args) => web::web_search(ctx, args).await,
    }
}

/// Map memory failures onto tool errors.
pub(crate) fn memory_error(err: MemoryError) -> ToolError {
    match err {
        err if err.is_unavailable() => ToolError::StoreUnavailable(err.to_string()),
        MemoryError::InvalidTopK(_) => ToolError::InvalidArguments(err.to_string()),
        other => ToolError::ExecutionFailed(other.to_string()),
    }
}
