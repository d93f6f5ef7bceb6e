//! Key-value storage backends for the match cache
//!
//! The cache only needs get/set/remove on string keys. `FileStore` keeps one
//! JSON file per key in an XDG-compliant cache directory; `MemoryStore` is
//! used when no such directory exists and in tests.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use directories::ProjectDirs;
use thiserror::Error;

/// Errors raised by a storage backend
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed
    #[error("storage I/O failed: {0}")]
    Io(#[from] io::Error),

    /// The in-memory map was poisoned by a panicking writer
    #[error("storage lock poisoned")]
    Poisoned,
}

/// Minimal string key-value capability, modelled on browser local storage
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored value, or `None` if the key is absent
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Stores `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removes `key`; removing an absent key is not an error
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Stores each key as `<key>.json` in a cache directory
///
/// Uses `~/.cache/livescore/` on Linux, or the equivalent XDG path on other
/// platforms. The directory is created on first write.
#[derive(Debug, Clone)]
pub struct FileStore {
    cache_dir: PathBuf,
}

impl FileStore {
    /// Creates a FileStore in the platform cache directory
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "livescore")?;
        Some(Self::with_dir(project_dirs.cache_dir().to_path_buf()))
    }

    /// Creates a FileStore rooted at a custom directory
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Directory holding the cache files
    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.cache_dir)?;
        fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Process-local store; contents vanish when the program exits
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (FileStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = FileStore::with_dir(temp_dir.path().to_path_buf());
        (store, temp_dir)
    }

    #[test]
    fn test_set_creates_file_in_cache_directory() {
        let (store, temp_dir) = create_test_store();

        store.set("lastMatches", "{\"data\":[]}").expect("Set should succeed");

        let expected_path = temp_dir.path().join("lastMatches.json");
        assert!(expected_path.exists(), "Cache file should exist");
        let content = fs::read_to_string(&expected_path).expect("Should read file");
        assert_eq!(content, "{\"data\":[]}");
    }

    #[test]
    fn test_get_returns_none_for_missing_key() {
        let (store, _temp_dir) = create_test_store();
        assert!(store.get("nonexistent").unwrap().is_none());
    }

    #[test]
    fn test_set_creates_directory_if_missing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let nested_path = temp_dir.path().join("nested").join("cache");
        let store = FileStore::with_dir(nested_path.clone());

        store.set("key", "value").expect("Set should succeed");

        assert!(nested_path.join("key.json").exists(), "Cache file should exist");
        assert_eq!(store.get("key").unwrap().as_deref(), Some("value"));
    }

    #[test]
    fn test_overwrite_and_remove() {
        let (store, _temp_dir) = create_test_store();

        store.set("key", "first").unwrap();
        store.set("key", "second").unwrap();
        assert_eq!(store.get("key").unwrap().as_deref(), Some("second"));

        store.remove("key").unwrap();
        assert!(store.get("key").unwrap().is_none());

        // Removing again is fine
        store.remove("key").unwrap();
    }

    #[test]
    fn test_set_fails_when_directory_is_a_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();
        let store = FileStore::with_dir(blocker);

        assert!(matches!(store.set("key", "value"), Err(StoreError::Io(_))));
    }

    #[test]
    fn test_new_creates_xdg_compliant_path() {
        if let Some(store) = FileStore::new() {
            let path_str = store.dir().to_string_lossy();
            assert!(path_str.contains("livescore"), "Cache path should contain project name");
        }
        // Passes if new() returns None (e.g., no home directory in CI)
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.get("key").unwrap().is_none());

        store.set("key", "value").unwrap();
        assert_eq!(store.get("key").unwrap().as_deref(), Some("value"));

        store.remove("key").unwrap();
        assert!(store.get("key").unwrap().is_none());
    }
}
