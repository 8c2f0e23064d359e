//! Checkpoint storage backends
//!
//! Checkpoints are keyed by `(epoch, iteration)` and carry the serialized
//! durable portion of a step state plus the metric values at save time.
//!
//! - [`FileStore`] - one JSON file per checkpoint in a directory
//! - [`MemoryStore`] - shared in-memory map, useful in tests

mod file;
mod memory;
mod record;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use record::{CheckpointKey, CheckpointRecord};

use crate::error::Result;

/// Trait for checkpoint storage backends
pub trait CheckpointStore: Send + Sync {
    /// Persist a record, replacing any record with the same key
    fn save(&self, record: &CheckpointRecord) -> Result<()>;

    /// Load the record stored under `key`
    fn load(&self, key: CheckpointKey) -> Result<CheckpointRecord>;

    /// All stored keys in ascending order
    fn keys(&self) -> Result<Vec<CheckpointKey>>;

    /// Most recent record by key order, if any
    fn latest(&self) -> Result<Option<CheckpointRecord>> {
        match self.keys()?.last() {
            Some(key) => self.load(*key).map(Some),
            None => Ok(None),
        }
    }

    /// Backend type name
    fn backend_type(&self) -> &'static str;
}
