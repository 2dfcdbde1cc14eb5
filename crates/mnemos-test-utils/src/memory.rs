use async_trait::async_trait;
use mnemos_memory::{
    Embedder, HashingEmbedder, InMemoryVectorStore, MemoryError, MemoryRecord, MemoryStore,
    RecordFilter, ScoredRecord, VectorStore,
};
use parking_lot::Mutex;
use std::sync::Arc;

/// Embedding width used by test stores.
const TEST_DIMENSION: usize = 256;

/// In-process memory store with a hashing embedder.
pub fn memory_store() -> Arc<MemoryStore> {
    memory_store_over(Arc::new(InMemoryVectorStore::new()))
}

/// Memory store over an arbitrary backend.
pub fn memory_store_over(store: Arc<dyn VectorStore>) -> Arc<MemoryStore> {
    let embedder = HashingEmbedder::new(TEST_DIMENSION).expect("hashing embedder");
    Arc::new(MemoryStore::new(store, Arc::new(embedder)))
}

/// Vector store whose every operation reports an outage.
#[derive(Default)]
pub struct DownStore;

fn down() -> MemoryError {
    MemoryError::StoreUnavailable("connection refused".to_string())
}

#[async_trait]
impl VectorStore for DownStore {
    async fn upsert(&self, _record: MemoryRecord) -> Result<MemoryRecord, MemoryError> {
        Err(down())
    }

    async fn upsert_if_version(
        &self,
        _record: MemoryRecord,
        _expected: Option<u64>,
    ) -> Result<MemoryRecord, MemoryError> {
        Err(down())
    }

    async fn get(&self, _id: &str) -> Result<Option<MemoryRecord>, MemoryError> {
        Err(down())
    }

    async fn search(
        &self,
        _embedding: &[f32],
        _filter: &RecordFilter,
        _limit: usize,
    ) -> Result<Vec<ScoredRecord>, MemoryError> {
        Err(down())
    }
}

/// Hashing embedder that records every text it embeds and can be told to
/// report the embedding service as unreachable after a number of calls.
pub struct RecordingEmbedder {
    inner: HashingEmbedder,
    healthy_calls: Option<usize>,
    texts: Mutex<Vec<String>>,
}

impl RecordingEmbedder {
    pub fn new() -> Self {
        Self {
            inner: HashingEmbedder::new(TEST_DIMENSION).expect("hashing embedder"),
            healthy_calls: None,
            texts: Mutex::new(Vec::new()),
        }
    }

    /// Answer `healthy_calls` requests, then fail every later one.
    pub fn failing_after(healthy_calls: usize) -> Self {
        Self {
            healthy_calls: Some(healthy_calls),
            ..Self::new()
        }
    }

    /// Texts requested so far, including failed ones.
    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().clone()
    }
}

impl Default for RecordingEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Embedder for RecordingEmbedder {
    fn dimension(&self) -> usize {
        TEST_DIMENSION
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, MemoryError> {
        let calls = {
            let mut texts = self.texts.lock();
            texts.push(text.to_string());
            texts.len()
        };
        if self.healthy_calls.is_some_and(|healthy| calls > healthy) {
            return Err(MemoryError::EmbeddingUnavailable(
                "embedding request failed: connection refused".to_string(),
            ));
        }
        self.inner.embed(text).await
    }
}
