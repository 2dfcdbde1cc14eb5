//! Vector store interface and the bundled in-memory and JSONL stores.

mod index;
mod jsonl;
mod memory;

pub use jsonl::JsonlVectorStore;
pub use memory::InMemoryVectorStore;

use crate::error::MemoryError;
use crate::model::{MemoryRecord, RecordFilter, ScoredRecord};
use async_trait::async_trait;

#[async_trait]
/// Persistence and similarity search for memory records.
pub trait VectorStore: Send + Sync {
    /// Insert or replace a record, returning it as stored.
    async fn upsert(&self, record: MemoryRecord) -> Result<MemoryRecord, MemoryError>;

    /// Write only if the stored version equals `expected`.
    ///
    /// `expected = None` means the record must not exist yet.
    async fn upsert_if_version(
        &self,
        record: MemoryRecord,
        expected: Option<u64>,
    ) -> Result<MemoryRecord, MemoryError>;

    /// Fetch a record by key.
    async fn get(&self, id: &str) -> Result<Option<MemoryRecord>, MemoryError>;

    /// Return at most `limit` records matching `filter`, by descending
    /// similarity and then newest first.
    async fn search(
        &self,
        embedding: &[f32],
        filter: &RecordFilter,
        limit: usize,
    ) -> Result<Vec<ScoredRecord>, MemoryError>;
}
