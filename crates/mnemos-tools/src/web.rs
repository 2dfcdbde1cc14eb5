//! Web provider interface for the `web_search` tool.

use async_trait::async_trait;
use mnemos_protocol::ToolError;
use serde::{Deserialize, Serialize};

/// Search result returned by a web provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebSearchResult {
    /// Result title.
    pub title: String,
    /// Result URL.
    pub url: String,
    /// Result snippet.
    pub snippet: String,
}

/// Web search backend.
#[async_trait]
pub trait WebProvider: Send + Sync {
    /// Perform a web search query returning at most `limit` results.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<WebSearchResult>, ToolError>;
}
