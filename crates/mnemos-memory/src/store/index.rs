//! In-process record index shared by the bundled stores.

use crate::embedder::cosine_similarity;
use crate::error::MemoryError;
use crate::model::{MemoryRecord, RecordFilter, ScoredRecord};
use std::cmp::Ordering;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub(super) struct RecordIndex {
    records: HashMap<String, MemoryRecord>,
    next_sequence: u64,
}

impl RecordIndex {
    /// Assign the next sequence and keep the original creation time on replace.
    pub(super) fn prepare(&mut self, mut record: MemoryRecord) -> MemoryRecord {
        self.next_sequence += 1;
        record.sequence = self.next_sequence;
        if let Some(existing) = self.records.get(&record.id) {
            record.created_at = existing.created_at;
        }
        record
    }

    /// Insert an already prepared record.
    pub(super) fn insert(&mut self, record: MemoryRecord) {
        self.next_sequence = self.next_sequence.max(record.sequence);
        self.records.insert(record.id.clone(), record);
    }

    pub(super) fn get(&self, id: &str) -> Option<&MemoryRecord> {
        self.records.get(id)
    }

    pub(super) fn check_version(&self, id: &str, expected: Option<u64>) -> Result<(), MemoryError> {
        let actual = self.records.get(id).map(|record| record.version);
        if actual == expected {
            Ok(())
        } else {
            Err(MemoryError::VersionConflict {
                id: id.to_string(),
                expected,
                actual,
            })
        }
    }

    pub(super) fn search(
        &self,
        embedding: &[f32],
        filter: &RecordFilter,
        limit: usize,
    ) -> Vec<ScoredRecord> {
        let mut hits: Vec<ScoredRecord> = self
            .records
            .values()
            .filter(|record| filter.matches(record))
            .map(|record| ScoredRecord {
                score: cosine_similarity(embedding, &record.embedding),
                record: record.clone(),
            })
            .collect();
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.record.sequence.cmp(&a.record.sequence))
        });
        hits.truncate(limit);
        hits
    }

    /// Records in insertion order.
    pub(super) fn ordered(&self) -> Vec<&MemoryRecord> {
        let mut records: Vec<&MemoryRecord> = self.records.values().collect();
        records.sort_by_key(|record| record.sequence);
        records
    }

    pub(super) fn len(&self) -> usize {
        self.records.len()
    }
}
