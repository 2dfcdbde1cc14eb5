//! Memory tool handlers.

use super::{Reply, memory_error};
use crate::context::ToolContext;
use crate::invocation::{SaveRecallMemoryArgs, SearchMemoryArgs, StoreCoreMemoryArgs};
use crate::{INDEX_OUT_OF_BOUNDS, MEMORY_STORED};
use log::{debug, info};
use mnemos_protocol::ToolError;
use serde_json::Value;

pub(super) async fn save_recall_memory(
    ctx: &ToolContext,
    args: SaveRecallMemoryArgs,
) -> Result<Reply, ToolError> {
    ctx.services
        .memory
        .append_recall(&ctx.owner_id, &args.memory)
        .await
        .map_err(memory_error)?;
    Ok(Reply::Value(Value::String(args.memory)))
}

pub(super) async fn search_memory(
    ctx: &ToolContext,
    args: SearchMemoryArgs,
) -> Result<Reply, ToolError> {
    let top_k = args.top_k.unwrap_or(ctx.services.defaults.search_top_k);
    let memories = ctx
        .services
        .memory
        .search_recall(&ctx.owner_id, &args.query, top_k)
        .await
        .map_err(memory_error)?;
    debug!(
        "search_memory (owner_id={}, top_k={}, returned={})",
        ctx.owner_id,
        top_k,
        memories.len()
    );
    Ok(Reply::Value(Value::from(memories)))
}

/// Insert at the front, or overwrite an in-bounds index, then swap the
/// whole list in with a versioned write.
pub(super) async fn store_core_memory(
    ctx: &ToolContext,
    args: StoreCoreMemoryArgs,
) -> Result<Reply, ToolError> {
    let StoreCoreMemoryArgs { memory, index } = args;
    let update = ctx
        .services
        .memory
        .update_core(&ctx.owner_id, |memories| match index {
            None => {
                memories.insert(0, memory.clone());
                true
            }
            Some(index) => match usize::try_from(index) {
                Ok(position) if position < memories.len() => {
                    memories[position] = memory.clone();
                    true
                }
                _ => false,
            },
        })
        .await
        .map_err(memory_error)?;
    if !update.written {
        info!(
            "core memory index rejected (owner_id={}, index={:?}, len={})",
            ctx.owner_id,
            index,
            update.memories.len()
        );
        return Ok(Reply::Rejected(INDEX_OUT_OF_BOUNDS.to_string()));
    }
    Ok(Reply::Value(Value::String(MEMORY_STORED.to_string())))
}
