//! In-memory checkpoint store

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use super::record::{CheckpointKey, CheckpointRecord};
use super::CheckpointStore;
use crate::error::{Error, Result};

/// In-memory checkpoint store
///
/// Clones share the same map, so a caller can keep one handle while the loop
/// owns another.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    records: Arc<RwLock<BTreeMap<CheckpointKey, CheckpointRecord>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored checkpoints
    pub fn len(&self) -> usize {
        self.records.read().map_or(0, |r| r.len())
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CheckpointStore for MemoryStore {
    fn save(&self, record: &CheckpointRecord) -> Result<()> {
        self.records
            .write()
            .map_err(|e| Error::Storage(e.to_string()))?
            .insert(record.key, record.clone());
        Ok(())
    }

    fn load(&self, key: CheckpointKey) -> Result<CheckpointRecord> {
        self.records
            .read()
            .map_err(|e| Error::Storage(e.to_string()))?
            .get(&key)
            .cloned()
            .ok_or_else(|| Error::CheckpointNotFound(key.to_string()))
    }

    fn keys(&self) -> Result<Vec<CheckpointKey>> {
        Ok(self
            .records
            .read()
            .map_err(|e| Error::Storage(e.to_string()))?
            .keys()
            .copied()
            .collect())
    }

    fn backend_type(&self) -> &'static str {
        "memory"
    }
}
