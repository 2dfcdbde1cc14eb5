//! Tool kinds and metadata specs presented to the model.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;

/// Tool metadata spec for schema presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Tool name.
    pub name: String,
    /// Tool description.
    pub description: String,
    /// JSON schema for tool arguments.
    pub args_schema: Value,
}

/// Every tool the agent can call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    SaveRecallMemory,
    SearchMemory,
    StoreCoreMemory,
    WebSearch,
}

impl ToolKind {
    /// All kinds, in the order they are presented to the model.
    pub const ALL: [ToolKind; 4] = [
        ToolKind::WebSearch,
        ToolKind::SaveRecallMemory,
        ToolKind::SearchMemory,
        ToolKind::StoreCoreMemory,
    ];

    /// Wire name used in tool calls.
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::SaveRecallMemory => "save_recall_memory",
            ToolKind::SearchMemory => "search_memory",
            ToolKind::StoreCoreMemory => "store_core_memory",
            ToolKind::WebSearch => "web_search",
        }
    }

    /// Resolve a wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn description(&self) -> &'static str {
        match self {
            ToolKind::SaveRecallMemory => {
                "Save a memory to the database for later semantic retrieval. Returns the saved memory."
            }
            ToolKind::SearchMemory => {
                "Search for memories in the database based on semantic similarity. Returns a list of relevant memories."
            }
            ToolKind::StoreCoreMemory => {
                "Store a core memory about the user. Without an index the memory is inserted first; with an index it replaces the memory at that position."
            }
            ToolKind::WebSearch => {
                "Search the web for current information. Returns titles, urls and snippets."
            }
        }
    }

    /// JSON schema for the tool arguments.
    pub fn args_schema(&self) -> Value {
        match self {
            ToolKind::SaveRecallMemory => json!({
                "type": "object",
                "properties": {
                    "memory": { "type": "string", "description": "The memory to be saved." }
                },
                "required": ["memory"],
            }),
            ToolKind::SearchMemory => json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "The search query." },
                    "top_k": {
                        "type": "integer",
                        "minimum": 1,
                        "default": 5,
                        "description": "The number of results to return."
                    }
                },
                "required": ["query"],
            }),
            ToolKind::StoreCoreMemory => json!({
                "type": "object",
                "properties": {
                    "memory": { "type": "string", "description": "The memory to store." },
                    "index": {
                        "type": "integer",
                        "description": "The index at which to store the memory."
                    }
                },
                "required": ["memory"],
            }),
            ToolKind::WebSearch => json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Search query to execute." }
                },
                "required": ["query"],
            }),
        }
    }

    /// Build the spec for model binding.
    pub fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            args_schema: self.args_schema(),
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
