//! Two-tier memory for Mnemos: one core record per owner plus an
//! append-only recall store searched by embedding similarity.

pub mod embedder;
pub mod error;
pub mod memory_store;
pub mod model;
pub mod store;

/// Embedding interface and the local hashing embedder.
pub use embedder::{Embedder, HashingEmbedder, cosine_similarity};
/// Memory error type.
pub use error::MemoryError;
/// Facade used by tools and the engine.
pub use memory_store::{CORE_WRITE_RETRIES, CoreUpdate, DEFAULT_TOP_K, MemoryStore};
/// Record model and key helpers.
pub use model::{
    CoreMemories, MemoryKind, MemoryRecord, RecordFilter, ScoredRecord, core_key, recall_key,
};
/// Vector store interface and bundled implementations.
pub use store::{InMemoryVectorStore, JsonlVectorStore, VectorStore};
