//! Key-value settings store.
//!
//! The core treats persistence as an opaque string-keyed store of JSON values.
//! Layout items and saved control item positions go through this trait so the
//! host application can back it with whatever it already uses.

use crate::error::StoreError;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Opaque key-value store for preferences and layout.
pub trait SettingsStore: Send + Sync {
    /// Read the value under `key`, if any.
    fn get(&self, key: &str) -> Option<Value>;

    /// Write `value` under `key`.
    fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Delete `key`. Missing keys are not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Every key currently stored.
    fn keys(&self) -> Vec<String>;
}

/// In-memory store, used for tests and as a fallback when the data
/// directory cannot be written.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.to_string(), value);
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        if let Ok(mut values) = self.values.lock() {
            values.remove(key);
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.values
            .lock()
            .map(|values| values.keys().cloned().collect())
            .unwrap_or_default()
    }
}

/// Store backed by a single JSON object file.
///
/// The whole file is rewritten on every mutation; the data set is a few
/// dozen small entries.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
}

impl JsonFileStore {
    /// File name used inside the data directory.
    pub const FILE_NAME: &'static str = "settings.json";

    /// Open (or lazily create) the store at `path`.
    ///
    /// A missing file yields an empty store; an unreadable or corrupt file is
    /// logged and also yields an empty store so the app can still start.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Map<String, Value>>(&contents) {
                Ok(map) => {
                    tracing::debug!("Loaded settings store from {:?}", path);
                    map
                }
                Err(e) => {
                    tracing::warn!("Failed to parse settings store {:?}: {}. Starting empty.", path, e);
                    Map::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => {
                tracing::warn!("Failed to read settings store {:?}: {}. Starting empty.", path, e);
                Map::new()
            }
        };

        Self {
            path,
            values: Mutex::new(values),
        }
    }

    /// Open the store in the platform data directory.
    pub fn open_default() -> Self {
        Self::open(stowbar_types::logging::data_dir().join(Self::FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, values: &Map<String, Value>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(values)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl SettingsStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value);
        self.flush(&values)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        if values.remove(key).is_some() {
            self.flush(&values)?;
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.values
            .lock()
            .map(|values| values.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(store.get("missing").is_none());
        store.set("a", json!(1)).unwrap();
        assert_eq!(store.get("a"), Some(json!(1)));
        store.remove("a").unwrap();
        assert!(store.get("a").is_none());
        // Removing twice is fine.
        store.remove("a").unwrap();
    }

    #[test]
    fn test_json_file_store_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(JsonFileStore::FILE_NAME);

        let store = JsonFileStore::open(&path);
        store.set("layout", json!([{"iconIdentifier": "a"}])).unwrap();
        store.set("other", json!("x")).unwrap();
        store.remove("other").unwrap();

        let reopened = JsonFileStore::open(&path);
        assert_eq!(reopened.get("layout"), Some(json!([{"iconIdentifier": "a"}])));
        assert!(reopened.get("other").is_none());
        assert_eq!(reopened.keys(), vec!["layout".to_string()]);
    }

    #[test]
    fn test_json_file_store_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(JsonFileStore::FILE_NAME);
        fs::write(&path, "{not json").unwrap();

        let store = JsonFileStore::open(&path);
        assert!(store.keys().is_empty());
    }
}
