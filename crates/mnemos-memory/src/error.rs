//! Error types for memory operations.

/// Errors returned by vector stores, embedders and the memory facade.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    /// The backing store could not be reached or written.
    #[error("memory store unavailable: {0}")]
    StoreUnavailable(String),
    /// A recall search asked for zero results.
    #[error("top_k must be a positive integer, got {0}")]
    InvalidTopK(usize),
    /// A compare-and-swap write lost against a concurrent writer.
    #[error("version conflict on {id} (expected={expected:?}, actual={actual:?})")]
    VersionConflict {
        id: String,
        expected: Option<u64>,
        actual: Option<u64>,
    },
    /// The embedder returned something unusable.
    #[error("embedding error: {0}")]
    Embedding(String),
    /// The embedding backend could not be reached or refused the request.
    #[error("embedding service unavailable: {0}")]
    EmbeddingUnavailable(String),
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl MemoryError {
    /// Whether the error means the store or its embedder is unusable.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            MemoryError::StoreUnavailable(_)
                | MemoryError::EmbeddingUnavailable(_)
                | MemoryError::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outages_are_unavailable_but_bad_payloads_are_not() {
        assert!(MemoryError::StoreUnavailable("down".to_string()).is_unavailable());
        assert!(MemoryError::EmbeddingUnavailable("connection refused".to_string()).is_unavailable());
        assert!(!MemoryError::Embedding("dimension 3, expected 4".to_string()).is_unavailable());
        assert!(!MemoryError::InvalidTopK(0).is_unavailable());
    }
}
