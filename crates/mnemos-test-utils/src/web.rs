use async_trait::async_trait;
use mnemos_protocol::ToolError;
use mnemos_tools::{WebProvider, WebSearchResult};
use parking_lot::Mutex;

/// Returns canned results and records each query and limit.
#[derive(Default)]
pub struct StubWebProvider {
    results: Vec<WebSearchResult>,
    queries: Mutex<Vec<(String, usize)>>,
}

impl StubWebProvider {
    pub fn new(results: Vec<WebSearchResult>) -> Self {
        Self {
            results,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<(String, usize)> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl WebProvider for StubWebProvider {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<WebSearchResult>, ToolError> {
        self.queries.lock().push((query.to_string(), limit));
        Ok(self.results.iter().take(limit).cloned().collect())
    }
}
