//! Typed, validated tool invocations parsed from model tool calls.

use crate::kind::ToolKind;
use mnemos_protocol::ToolError;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Arguments for `save_recall_memory`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SaveRecallMemoryArgs {
    pub memory: String,
}

/// Arguments for `search_memory`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMemoryArgs {
    pub query: String,
    /// Validated positive result count; `None` uses the configured default.
    pub top_k: Option<usize>,
}

#[derive(Deserialize)]
struct RawSearchMemoryArgs {
    query: String,
    #[serde(default)]
    top_k: Option<i64>,
}

/// Arguments for `store_core_memory`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoreCoreMemoryArgs {
    pub memory: String,
    /// Position to overwrite; bounds are checked against the stored list.
    #[serde(default)]
    pub index: Option<i64>,
}

/// Arguments for `web_search`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WebSearchArgs {
    pub query: String,
}

/// A tool call resolved to its kind with typed arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolInvocation {
    SaveRecallMemory(SaveRecallMemoryArgs),
    SearchMemory(SearchMemoryArgs),
    StoreCoreMemory(StoreCoreMemoryArgs),
    WebSearch(WebSearchArgs),
}

impl ToolInvocation {
    /// Parse a tool call by name and JSON arguments.
    pub fn parse(name: &str, arguments: &Value) -> Result<Self, ToolError> {
        let kind =
            ToolKind::from_name(name).ok_or_else(|| ToolError::ToolNotFound(name.to_string()))?;
        Self::parse_kind(kind, arguments)
    }

    /// Parse arguments for an already resolved kind.
    pub fn parse_kind(kind: ToolKind, arguments: &Value) -> Result<Self, ToolError> {
        match kind {
            ToolKind::SaveRecallMemory => {
                let args: SaveRecallMemoryArgs = parse_args(arguments)?;
                require_text(&args.memory, "memory")?;
                Ok(ToolInvocation::SaveRecallMemory(args))
            }
            ToolKind::SearchMemory => {
                let raw: RawSearchMemoryArgs = parse_args(arguments)?;
                require_text(&raw.query, "query")?;
                let top_k = match raw.top_k {
                    Some(value) if value <= 0 => {
                        return Err(ToolError::InvalidArguments(format!(
                            "top_k must be a positive integer, got {value}"
                        )));
                    }
                    Some(value) => Some(value as usize),
                    None => None,
                };
                Ok(ToolInvocation::SearchMemory(SearchMemoryArgs {
                    query: raw.query,
                    top_k,
                }))
            }
            ToolKind::StoreCoreMemory => {
                let args: StoreCoreMemoryArgs = parse_args(arguments)?;
                require_text(&args.memory, "memory")?;
                Ok(ToolInvocation::StoreCoreMemory(args))
            }
            ToolKind::WebSearch => {
                let args: WebSearchArgs = parse_args(arguments)?;
                require_text(&args.query, "query")?;
                Ok(ToolInvocation::WebSearch(args))
            }
        }
    }

    pub fn kind(&self) -> ToolKind {
        match self {
            ToolInvocation::SaveRecallMemory(_) => ToolKind::SaveRecallMemory,
            ToolInvocation::SearchMemory(_) => ToolKind::SearchMemory,
            ToolInvocation::StoreCoreMemory(_) => ToolKind::StoreCoreMemory,
            ToolInvocation::WebSearch(_) => ToolKind::WebSearch,
        }
    }
}

/// Parse JSON args into a typed struct for tool calls.
fn parse_args<T: DeserializeOwned>(args: &Value) -> Result<T, ToolError> {
    T::deserialize(args).map_err(|err| ToolError::InvalidArguments(err.to_string()))
}

fn require_text(value: &str, field: &str) -> Result<(), ToolError> {
    if value.trim().is_empty() {
        return Err(ToolError::InvalidArguments(format!(
            "{field} cannot be empty"
        )));
    }
    Ok(())
}
