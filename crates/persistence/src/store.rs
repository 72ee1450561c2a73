//! Key-value stores holding one JSON value per semantic key.

use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(String),
    #[error("corrupt store: {0}")]
    Corrupt(String),
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e.to_string())
    }
}

/// Durable mapping from named keys to JSON values.
pub trait KeyValueStore {
    /// Value under `key`, or `None` when it was never written.
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Write several entries as one unit: either all land or none do.
    fn set_many(&mut self, values: Vec<(String, Value)>) -> Result<(), StoreError> {
        for (key, value) in values {
            self.set(&key, value)?;
        }
        Ok(())
    }

    /// Every stored entry, ordered by key.
    fn entries(&self) -> Result<BTreeMap<String, Value>, StoreError>;

    /// Replace the whole store content in one step.
    fn replace_all(&mut self, entries: BTreeMap<String, Value>) -> Result<(), StoreError>;
}

/// In-memory store, used by tests and by headless sessions without a save file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemoryStore {
    entries: BTreeMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn entries(&self) -> Result<BTreeMap<String, Value>, StoreError> {
        Ok(self.entries.clone())
    }

    fn replace_all(&mut self, entries: BTreeMap<String, Value>) -> Result<(), StoreError> {
        self.entries = entries;
        Ok(())
    }
}

/// Store persisted as a single JSON object on disk.
///
/// Every write rewrites the file through a temporary sibling and a rename,
/// so a crash never leaves a half-written save behind.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, Value>,
}

impl JsonFileStore {
    /// Open the store at `path`, starting empty when the file does not exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let text = fs::read_to_string(&path)?;
            serde_json::from_str(&text).map_err(|e| StoreError::Corrupt(e.to_string()))?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, Value>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let text = serde_json::to_string_pretty(entries)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), keys = entries.len(), "store flushed");
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        self.set_many(vec![(key.to_string(), value)])
    }

    fn set_many(&mut self, values: Vec<(String, Value)>) -> Result<(), StoreError> {
        let mut next = self.entries.clone();
        next.extend(values);
        self.flush(&next)?;
        self.entries = next;
        Ok(())
    }

    fn entries(&self) -> Result<BTreeMap<String, Value>, StoreError> {
        Ok(self.entries.clone())
    }

    fn replace_all(&mut self, entries: BTreeMap<String, Value>) -> Result<(), StoreError> {
        self.flush(&entries)?;
        self.entries = entries;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("typing-tycoon-{}-{name}.json", std::process::id()))
    }

    #[test]
    fn memory_store_get_set() {
        let mut s = MemoryStore::new();
        assert_eq!(s.get("balance").unwrap(), None);
        s.set("balance", json!("12.5")).unwrap();
        assert_eq!(s.get("balance").unwrap(), Some(json!("12.5")));
    }

    #[test]
    fn file_store_persists_across_open() {
        let path = temp_path("persist");
        let _ = fs::remove_file(&path);
        {
            let mut s = JsonFileStore::open(&path).unwrap();
            s.set("streakCount", json!(7)).unwrap();
        }
        let s = JsonFileStore::open(&path).unwrap();
        assert_eq!(s.get("streakCount").unwrap(), Some(json!(7)));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn file_store_batch_lands_together() {
        let path = temp_path("batch");
        let _ = fs::remove_file(&path);
        let mut s = JsonFileStore::open(&path).unwrap();
        s.set_many(vec![
            ("balance".to_string(), json!("75")),
            ("upgradeOwnership".to_string(), json!({ "1": 1 })),
        ])
        .unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let on_disk: BTreeMap<String, Value> = serde_json::from_str(&text).unwrap();
        assert_eq!(on_disk, s.entries().unwrap());
        assert_eq!(on_disk.len(), 2);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn failed_flush_keeps_previous_entries() {
        let dir = std::env::temp_dir()
            .join(format!("typing-tycoon-{}-blocked", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        // the store path is a directory, so the final rename fails
        let mut s = JsonFileStore {
            path: dir.clone(),
            entries: BTreeMap::new(),
        };
        assert!(s.set_many(vec![("balance".to_string(), json!("1"))]).is_err());
        assert!(s.entries().unwrap().is_empty());
        let _ = fs::remove_file(dir.with_extension("tmp"));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn corrupt_file_is_reported() {
        let path = temp_path("corrupt");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            JsonFileStore::open(&path),
            Err(StoreError::Corrupt(_))
        ));
        fs::remove_file(&path).unwrap();
    }
}
