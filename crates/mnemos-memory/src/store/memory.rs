//! Process-local vector store.

use super::VectorStore;
use super::index::RecordIndex;
use crate::error::MemoryError;
use crate::model::{MemoryRecord, RecordFilter, ScoredRecord};
use async_trait::async_trait;
use log::debug;
use parking_lot::RwLock;

/// Vector store kept entirely in memory; contents are lost on drop.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    index: RwLock<RecordIndex>,
}

impl InMemoryVectorStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn upsert(&self, record: MemoryRecord) -> Result<MemoryRecord, MemoryError> {
        let mut index = self.index.write();
        let record = index.prepare(record);
        debug!(
            "upserted memory record (id={}, sequence={})",
            record.id, record.sequence
        );
        index.insert(record.clone());
        Ok(record)
    }

    async fn upsert_if_version(
        &self,
        record: MemoryRecord,
        expected: Option<u64>,
    ) -> Result<MemoryRecord, MemoryError> {
        let mut index = self.index.write();
        index.check_version(&record.id, expected)?;
        let record = index.prepare(record);
        index.insert(record.clone());
        Ok(record)
    }

    async fn get(&self, id: &str) -> Result<Option<MemoryRecord>, MemoryError> {
        Ok(self.index.read().get(id).cloned())
    }

    async fn search(
        &self,
        embedding: &[f32],
        filter: &RecordFilter,
        limit: usize,
    ) -> Result<Vec<ScoredRecord>, MemoryError> {
        Ok(self.index.read().search(embedding, filter, limit))
    }
}
