//! File-backed vector store using an append-only JSONL log.

use super::VectorStore;
use super::index::RecordIndex;
use crate::error::MemoryError;
use crate::model::{MemoryRecord, RecordFilter, ScoredRecord};
use async_trait::async_trait;
use log::{debug, info, warn};
use parking_lot::RwLock;
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Log filename under the store root.
const LOG_FILE: &str = "memories.jsonl";
/// Temporary filename used while compacting.
const TEMP_FILE: &str = "memories.jsonl.tmp";

/// Vector store that keeps an in-memory index and appends every write to a
/// JSONL log. The log is replayed on open; the last line per id wins.
#[derive(Debug)]
pub struct JsonlVectorStore {
    /// Root directory for the log.
    root: PathBuf,
    index: RwLock<RecordIndex>,
}

impl JsonlVectorStore {
    /// Open (or create) a store under the given root directory.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, MemoryError> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        let index = replay(&root.join(LOG_FILE))?;
        info!(
            "opened jsonl memory store (root={}, records={})",
            root.display(),
            index.len()
        );
        Ok(Self {
            root,
            index: RwLock::new(index),
        })
    }

    /// Path to the JSONL log.
    pub fn log_path(&self) -> PathBuf {
        self.root.join(LOG_FILE)
    }

    /// Rewrite the log with only the live record per id.
    pub fn compact(&self) -> Result<usize, MemoryError> {
        let index = self.index.write();
        let path = self.log_path();
        let temp_path = self.root.join(TEMP_FILE);
        let records = index.ordered();
        {
            let mut file = OpenOptions::new()
                .create(true)
                .truncate(true)
                .write(true)
                .open(&temp_path)
                .map_err(unavailable)?;
            for record in &records {
                let line = serde_json::to_string(record)?;
                writeln!(file, "{line}").map_err(unavailable)?;
            }
            file.sync_all().map_err(unavailable)?;
        }
        std::fs::rename(&temp_path, &path).map_err(unavailable)?;
        info!(
            "compacted jsonl memory store (root={}, records={})",
            self.root.display(),
            records.len()
        );
        Ok(records.len())
    }

    /// Append a record to the log. Callers hold the index write lock.
    fn append(&self, record: &MemoryRecord) -> Result<(), MemoryError> {
        let line = serde_json::to_string(record)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.log_path())
            .map_err(unavailable)?;
        writeln!(file, "{line}").map_err(unavailable)?;
        debug!(
            "appended memory record (id={}, kind={:?}, sequence={})",
            record.id, record.kind, record.sequence
        );
        Ok(())
    }
}

#[async_trait]
impl VectorStore for JsonlVectorStore {
    async fn upsert(&self, record: MemoryRecord) -> Result<MemoryRecord, MemoryError> {
        let mut index = self.index.write();
        let record = index.prepare(record);
        self.append(&record)?;
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
        self.append(&record)?;
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

/// Rebuild the index from the log; a missing log yields an empty index.
fn replay(path: &Path) -> Result<RecordIndex, MemoryError> {
    let mut index = RecordIndex::default();
    if !path.exists() {
        return Ok(index);
    }
    let file = OpenOptions::new().read(true).open(path).map_err(unavailable)?;
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(unavailable)?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<MemoryRecord>(&line) {
            Ok(record) => index.insert(record),
            Err(err) => warn!(
                "skipping malformed memory log line (path={}, line={}, error={})",
                path.display(),
                line_no + 1,
                err
            ),
        }
    }
    Ok(index)
}

fn unavailable(err: std::io::Error) -> MemoryError {
    MemoryError::StoreUnavailable(err.to_string())
}
