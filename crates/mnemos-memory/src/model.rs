//! Memory record model and key layout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Which memory tier a record belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MemoryKind {
    /// The single mutable per-owner fact list.
    Core,
    /// Immutable snippets retrieved by similarity.
    Recall,
}

/// Persisted memory record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryRecord {
    /// Deterministic record key (see [`core_key`] and [`recall_key`]).
    pub id: String,
    /// Memory tier.
    pub kind: MemoryKind,
    /// Owner partition for every read and write.
    pub owner_id: String,
    /// Recall text; empty for core records.
    pub content: String,
    /// Core fact list as `{"memories": [...]}`; null for recall records.
    #[serde(default)]
    pub payload: Value,
    /// Embedding vector used for similarity search.
    pub embedding: Vec<f32>,
    /// Write counter used for compare-and-swap.
    pub version: u64,
    /// Store-assigned insertion order.
    #[serde(default)]
    pub sequence: u64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last write timestamp.
    pub updated_at: DateTime<Utc>,
}

impl MemoryRecord {
    /// Build a fresh recall record with a newly generated key.
    pub fn recall(owner_id: &str, content: impl Into<String>, embedding: Vec<f32>) -> Self {
        let now = Utc::now();
        Self {
            id: recall_key(owner_id, Uuid::new_v4()),
            kind: MemoryKind::Recall,
            owner_id: owner_id.to_string(),
            content: content.into(),
            payload: Value::Null,
            embedding,
            version: 1,
            sequence: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Build the core record for an owner holding the given fact list.
    pub fn core(owner_id: &str, memories: &[String], dimension: usize, version: u64) -> Self {
        let now = Utc::now();
        Self {
            id: core_key(owner_id),
            kind: MemoryKind::Core,
            owner_id: owner_id.to_string(),
            content: String::new(),
            payload: serde_json::json!({ "memories": memories }),
            embedding: vec![0.0; dimension],
            version,
            sequence: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Decode the core fact list from the payload.
    pub fn core_memories(&self) -> Result<Vec<String>, serde_json::Error> {
        #[derive(Deserialize)]
        struct CorePayload {
            #[serde(default)]
            memories: Vec<String>,
        }
        let payload: CorePayload = serde_json::from_value(self.payload.clone())?;
        Ok(payload.memories)
    }
}

/// Key of the single core record for an owner.
pub fn core_key(owner_id: &str) -> String {
    format!("core/{owner_id}")
}

/// Key of a recall record for an owner.
pub fn recall_key(owner_id: &str, event_id: Uuid) -> String {
    format!("recall/{owner_id}/{event_id}")
}

/// Current core fact list for an owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreMemories {
    /// Record key the list lives under.
    pub key: String,
    /// Ordered facts, newest inserts first.
    pub memories: Vec<String>,
    /// Stored version, `None` when no record exists yet.
    pub version: Option<u64>,
}

/// Equality filters applied to a similarity search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub owner_id: Option<String>,
    pub kind: Option<MemoryKind>,
}

impl RecordFilter {
    /// Filter on recall records of one owner.
    pub fn recall_for(owner_id: &str) -> Self {
        Self {
            owner_id: Some(owner_id.to_string()),
            kind: Some(MemoryKind::Recall),
        }
    }

    /// Whether a record passes every set filter.
    pub fn matches(&self, record: &MemoryRecord) -> bool {
        self.owner_id
            .as_deref()
            .is_none_or(|owner| owner == record.owner_id)
            && self.kind.is_none_or(|kind| kind == record.kind)
    }
}

/// Search hit with its similarity score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub record: MemoryRecord,
    pub score: f32,
}
