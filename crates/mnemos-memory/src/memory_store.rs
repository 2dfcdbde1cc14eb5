//! `MemoryStore` facade over a vector store and an embedder.

use crate::embedder::Embedder;
use crate::error::MemoryError;
use crate::model::{CoreMemories, MemoryRecord, RecordFilter, core_key};
use crate::store::VectorStore;
use log::{debug, info, warn};
use std::sync::Arc;

/// Default number of recall results.
pub const DEFAULT_TOP_K: usize = 5;
/// Extra compare-and-swap attempts made by [`MemoryStore::update_core`].
pub const CORE_WRITE_RETRIES: usize = 3;

/// Outcome of a read-modify-write on the core list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreUpdate {
    /// The list after the edit (unchanged when nothing was written).
    pub memories: Vec<String>,
    /// Stored version after the call.
    pub version: Option<u64>,
    /// Whether the edit asked for a write and it landed.
    pub written: bool,
}

/// Owner-scoped access to core and recall memory.
#[derive(Clone)]
pub struct MemoryStore {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    min_score: Option<f32>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("dimension", &self.embedder.dimension())
            .field("min_score", &self.min_score)
            .finish()
    }
}

impl MemoryStore {
    /// Create a facade over a vector store and embedder.
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            store,
            embedder,
            min_score: None,
        }
    }

    /// Drop recall hits scoring below `min_score`.
    pub fn with_min_score(mut self, min_score: Option<f32>) -> Self {
        self.min_score = min_score;
        self
    }

    /// Load the owner's core list; an absent record is an empty list.
    pub async fn fetch_core(&self, owner_id: &str) -> Result<CoreMemories, MemoryError> {
        let key = core_key(owner_id);
        let Some(record) = self.store.get(&key).await? else {
            debug!("no core memory yet (owner_id={owner_id})");
            return Ok(CoreMemories {
                key,
                memories: Vec::new(),
                version: None,
            });
        };
        let memories = record.core_memories()?;
        Ok(CoreMemories {
            key,
            memories,
            version: Some(record.version),
        })
    }

    /// Similarity search over the owner's recall records.
    pub async fn search_recall(
        &self,
        owner_id: &str,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<String>, MemoryError> {
        if top_k == 0 {
            return Err(MemoryError::InvalidTopK(top_k));
        }
        let embedding = self.embedder.embed(query).await?;
        let hits = self
            .store
            .search(&embedding, &RecordFilter::recall_for(owner_id), top_k)
            .await?;
        let results: Vec<String> = hits
            .into_iter()
            .filter(|hit| self.min_score.is_none_or(|min| hit.score >= min))
            .map(|hit| hit.record.content)
            .collect();
        debug!(
            "recall search (owner_id={}, top_k={}, returned={})",
            owner_id,
            top_k,
            results.len()
        );
        Ok(results)
    }

    /// Embed and store a new recall record, returning its key.
    pub async fn append_recall(&self, owner_id: &str, text: &str) -> Result<String, MemoryError> {
        let embedding = self.embedder.embed(text).await?;
        let record = self
            .store
            .upsert(MemoryRecord::recall(owner_id, text, embedding))
            .await?;
        info!(
            "recall memory saved (owner_id={}, id={}, content_len={})",
            owner_id,
            record.id,
            text.len()
        );
        Ok(record.id)
    }

    /// Replace the owner's core list if the stored version is still
    /// `expected_version`, returning the new version.
    pub async fn upsert_core(
        &self,
        owner_id: &str,
        memories: &[String],
        expected_version: Option<u64>,
    ) -> Result<u64, MemoryError> {
        let version = expected_version.map_or(1, |current| current + 1);
        let record = MemoryRecord::core(owner_id, memories, self.embedder.dimension(), version);
        let stored = self.store.upsert_if_version(record, expected_version).await?;
        info!(
            "core memory written (owner_id={}, version={}, count={})",
            owner_id,
            stored.version,
            memories.len()
        );
        Ok(stored.version)
    }

    /// Read the core list, apply `edit`, and write it back with
    /// compare-and-swap, retrying when a concurrent writer wins.
    ///
    /// `edit` returns `false` to leave the record untouched.
    pub async fn update_core<F>(&self, owner_id: &str, mut edit: F) -> Result<CoreUpdate, MemoryError>
    where
        F: FnMut(&mut Vec<String>) -> bool + Send,
    {
        let mut attempt = 0;
        loop {
            let current = self.fetch_core(owner_id).await?;
            let mut memories = current.memories.clone();
            if !edit(&mut memories) {
                return Ok(CoreUpdate {
                    memories: current.memories,
                    version: current.version,
                    written: false,
                });
            }
            match self.upsert_core(owner_id, &memories, current.version).await {
                Ok(version) => {
                    return Ok(CoreUpdate {
                        memories,
                        version: Some(version),
                        written: true,
                    });
                }
                Err(MemoryError::VersionConflict { .. }) if attempt < CORE_WRITE_RETRIES => {
                    attempt += 1;
                    warn!(
                        "core memory write conflicted, retrying (owner_id={owner_id}, attempt={attempt})"
                    );
                }
                Err(err) => return Err(err),
            }
        }
    }
}
