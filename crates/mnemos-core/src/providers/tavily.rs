//! Tavily web search provider.

use async_trait::async_trait;
use log::debug;
use mnemos_config::WebSearchConfig;
use mnemos_protocol::ToolError;
use mnemos_tools::{WebProvider, WebSearchResult};
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://api.tavily.com";

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    max_results: usize,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

impl From<SearchHit> for WebSearchResult {
    fn from(hit: SearchHit) -> Self {
        WebSearchResult {
            title: hit.title,
            url: hit.url,
            snippet: hit.content,
        }
    }
}

/// Web provider calling the Tavily search API.
pub struct TavilySearchProvider {
    base_url: String,
    api_key: String,
    http_client: reqwest::Client,
}

impl TavilySearchProvider {
    pub fn new(base_url: Option<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key: api_key.into(),
            http_client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &WebSearchConfig, api_key: impl Into<String>) -> Self {
        Self::new(config.base_url.clone(), api_key)
    }
}

fn failed(message: String) -> ToolError {
    ToolError::ExecutionFailed(message)
}

#[async_trait]
impl WebProvider for TavilySearchProvider {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<WebSearchResult>, ToolError> {
        let url = format!("{}/search", self.base_url);
        debug!("web search request (limit={}, query_len={})", limit, query.len());
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&SearchRequest {
                query,
                max_results: limit,
            })
            .send()
            .await
            .map_err(|e| failed(format!("web search request failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(failed(format!("web search API error {status}: {body}")));
        }
        let decoded: SearchResponse = response
            .json()
            .await
            .map_err(|e| failed(format!("failed to parse web search response: {e}")))?;
        Ok(decoded
            .results
            .into_iter()
            .take(limit)
            .map(WebSearchResult::from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn hits_map_content_to_snippet() {
        let response: SearchResponse = serde_json::from_value(json!({
            "query": "rust",
            "results": [
                { "title": "Rust", "url": "https://www.rust-lang.org", "content": "A language", "score": 0.9 }
            ]
        }))
        .expect("decode");
        let results: Vec<WebSearchResult> =
            response.results.into_iter().map(WebSearchResult::from).collect();
        assert_eq!(
            results,
            vec![WebSearchResult {
                title: "Rust".to_string(),
                url: "https://www.rust-lang.org".to_string(),
                snippet: "A language".to_string(),
            }]
        );
    }

    #[test]
    fn request_body_carries_limit() {
        let body = serde_json::to_value(SearchRequest {
            query: "weather",
            max_results: 1,
        })
        .expect("serialize");
        assert_eq!(body, json!({ "query": "weather", "max_results": 1 }));
    }
}
