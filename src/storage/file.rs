//! Filesystem checkpoint store

use std::path::{Path, PathBuf};

use super::record::{CheckpointKey, CheckpointRecord};
use super::CheckpointStore;
use crate::error::{Error, Result};

/// Stores each checkpoint as a pretty-printed JSON file in one directory
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir` (created on first save)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the checkpoint files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file for `key`
    pub fn path_for(&self, key: CheckpointKey) -> PathBuf {
        self.dir.join(key.file_name())
    }
}

impl CheckpointStore for FileStore {
    fn save(&self, record: &CheckpointRecord) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| Error::io(format!("creating {}", self.dir.display()), e))?;

        // Write to a sibling temp file first so readers never see a partial record
        let path = self.path_for(record.key);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(record)?;
        std::fs::write(&tmp, json)
            .map_err(|e| Error::io(format!("writing {}", tmp.display()), e))?;
        std::fs::rename(&tmp, &path)
            .map_err(|e| Error::io(format!("renaming {}", tmp.display()), e))?;
        Ok(())
    }

    fn load(&self, key: CheckpointKey) -> Result<CheckpointRecord> {
        let path = self.path_for(key);
        if !path.exists() {
            return Err(Error::CheckpointNotFound(path.display().to_string()));
        }
        let bytes = std::fs::read(&path)
            .map_err(|e| Error::io(format!("reading {}", path.display()), e))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn keys(&self) -> Result<Vec<CheckpointKey>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let entries = std::fs::read_dir(&self.dir)
            .map_err(|e| Error::io(format!("listing {}", self.dir.display()), e))?;

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(format!("listing {}", self.dir.display()), e))?;
            if let Some(key) = entry.file_name().to_str().and_then(CheckpointKey::from_file_name) {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn backend_type(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::train::MetricValues;
    use tempfile::TempDir;

    fn record(epoch: usize, iteration: usize) -> CheckpointRecord {
        CheckpointRecord::new(
            CheckpointKey::new(epoch, iteration),
            &MetricValues::default(),
            serde_json::json!({ "weights": [0.5, -0.25] }),
        )
    }

    #[test]
    fn test_save_creates_directory_and_file() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path().join("ckpt"));
        store.save(&record(1, 8)).unwrap();
        assert!(store.path_for(CheckpointKey::new(1, 8)).exists());
        assert!(!store.dir().join("checkpoint_epoch_1_iter_8.json.tmp").exists());
    }

    #[test]
    fn test_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path());
        let saved = record(2, 3);
        store.save(&saved).unwrap();
        let loaded = store.load(saved.key).unwrap();
        assert_eq!(loaded, saved);
    }

    #[test]
    fn test_keys_ignore_foreign_files_and_sort() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path());
        store.save(&record(10, 1)).unwrap();
        store.save(&record(2, 1)).unwrap();
        std::fs::write(tmp.path().join("README.md"), "notes").unwrap();

        assert_eq!(
            store.keys().unwrap(),
            vec![CheckpointKey::new(2, 1), CheckpointKey::new(10, 1)]
        );
        assert_eq!(store.latest().unwrap().unwrap().key, CheckpointKey::new(10, 1));
    }

    #[test]
    fn test_missing_directory_has_no_keys() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path().join("absent"));
        assert!(store.keys().unwrap().is_empty());
        assert!(matches!(
            store.load(CheckpointKey::new(1, 1)).unwrap_err(),
            Error::CheckpointNotFound(_)
        ));
    }
}
