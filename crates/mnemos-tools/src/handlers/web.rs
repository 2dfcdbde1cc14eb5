//! Web search handler.

use super::Reply;
use crate::context::ToolContext;
use crate::invocation::WebSearchArgs;
use log::info;
use mnemos_protocol::ToolError;
use serde_json::json;

pub(super) async fn web_search(ctx: &ToolContext, args: WebSearchArgs) -> Result<Reply, ToolError> {
    let provider = ctx
        .services
        .web
        .as_ref()
        .ok_or_else(|| ToolError::ExecutionFailed("web provider not configured".to_string()))?;
    let limit = ctx.services.defaults.web_max_results;
    info!(
        "web search (query_len={}, limit={})",
        args.query.len(),
        limit
    );
    let results = provider.search(&args.query, limit).await?;
    Ok(Reply::Value(json!({
        "query": args.query,
        "results": results,
    })))
}
