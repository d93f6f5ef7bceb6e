//! Time-boxed cache of the last successful match list
//!
//! The cache is an optimization, not a guarantee: every storage or parse
//! failure is logged and reported to the caller as "nothing cached".

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::store::KeyValueStore;
use crate::data::Match;

/// Storage key holding the serialized entry
pub const CACHE_KEY: &str = "lastMatches";

/// Entries at least this old are ignored
pub const FRESHNESS_WINDOW_MS: i64 = 3_600_000;

/// Wrapper stored under `CACHE_KEY`
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry<T> {
    /// The cached matches
    data: T,
    /// Capture time in epoch milliseconds
    timestamp: i64,
}

/// Persists the last successful fetch through a `KeyValueStore`
pub struct MatchCache {
    store: Box<dyn KeyValueStore>,
}

impl MatchCache {
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    /// Writes `matches` with `now_ms` as the capture time.
    ///
    /// Failures (full disk, unwritable directory) are logged and dropped.
    pub fn save(&self, matches: &[Match], now_ms: i64) {
        let entry = CacheEntry {
            data: matches,
            timestamp: now_ms,
        };

        let json = match serde_json::to_string(&entry) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to serialize match cache");
                return;
            }
        };

        match self.store.set(CACHE_KEY, &json) {
            Ok(()) => debug!(count = matches.len(), "Match cache written"),
            Err(e) => warn!(error = %e, "Failed to write match cache"),
        }
    }

    /// Returns the cached matches if an entry exists, parses, and is younger
    /// than the freshness window at `now_ms`.
    pub fn load_if_fresh(&self, now_ms: i64) -> Option<Vec<Match>> {
        let content = match self.store.get(CACHE_KEY) {
            Ok(Some(content)) => content,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Failed to read match cache");
                return None;
            }
        };

        let entry: CacheEntry<Vec<Match>> = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable match cache");
                return None;
            }
        };

        let age_ms = now_ms - entry.timestamp;
        if age_ms >= FRESHNESS_WINDOW_MS {
            debug!(age_ms, "Match cache is stale");
            return None;
        }

        Some(entry.data)
    }

    /// Drops the cached entry
    pub fn clear(&self) {
        if let Err(e) = self.store.remove(CACHE_KEY) {
            warn!(error = %e, "Failed to clear match cache");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::store::{FileStore, MemoryStore, StoreError};
    use crate::data::{Elapsed, Event, EventKind};
    use serde_json::{json, Map};
    use std::sync::Arc;
    use tempfile::TempDir;

    const NOW: i64 = 1_700_000_000_000;

    fn sample_matches() -> Vec<Match> {
        let mut extra = Map::new();
        extra.insert("detail".to_string(), json!("Yellow Card"));
        extra.insert("time".to_string(), json!({ "elapsed": 31, "extra": null }));

        vec![
            Match {
                id: 100,
                home_team: "Ajax".to_string(),
                away_team: "PSV".to_string(),
                home_score: Some(1),
                away_score: Some(1),
                elapsed: Elapsed::Minutes(77),
                competition: "Eredivisie".to_string(),
                status: "Second Half".to_string(),
                events: vec![Event {
                    kind: EventKind::Card,
                    extra,
                }],
            },
            Match {
                id: 200,
                home_team: "Porto".to_string(),
                away_team: "Benfica".to_string(),
                home_score: None,
                away_score: None,
                elapsed: Elapsed::HalfTime,
                competition: "Primeira Liga".to_string(),
                status: "Halftime".to_string(),
                events: Vec::new(),
            },
        ]
    }

    /// Store whose every operation fails
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Poisoned)
        }
        fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Poisoned)
        }
        fn remove(&self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::Poisoned)
        }
    }

    /// Lets a test seed and inspect the store behind a cache
    #[derive(Clone, Default)]
    struct SharedStore(Arc<MemoryStore>);

    impl KeyValueStore for SharedStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.0.get(key)
        }
        fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
            self.0.set(key, value)
        }
        fn remove(&self, key: &str) -> Result<(), StoreError> {
            self.0.remove(key)
        }
    }

    #[test]
    fn test_save_then_load_returns_same_matches() {
        let cache = MatchCache::new(MemoryStore::new());
        let matches = sample_matches();

        cache.save(&matches, NOW);

        assert_eq!(cache.load_if_fresh(NOW), Some(matches));
    }

    #[test]
    fn test_load_returns_none_when_absent() {
        let cache = MatchCache::new(MemoryStore::new());
        assert!(cache.load_if_fresh(NOW).is_none());
    }

    #[test]
    fn test_entry_is_fresh_just_inside_window() {
        let cache = MatchCache::new(MemoryStore::new());
        cache.save(&sample_matches(), NOW);

        assert!(cache.load_if_fresh(NOW + FRESHNESS_WINDOW_MS - 1).is_some());
    }

    #[test]
    fn test_entry_is_stale_at_one_hour() {
        let cache = MatchCache::new(MemoryStore::new());
        cache.save(&sample_matches(), NOW);

        assert!(cache.load_if_fresh(NOW + FRESHNESS_WINDOW_MS).is_none());
        assert!(cache.load_if_fresh(NOW + 2 * FRESHNESS_WINDOW_MS).is_none());
    }

    #[test]
    fn test_unparseable_entry_reads_as_absent() {
        let store = SharedStore::default();
        store.set(CACHE_KEY, "{ this is not json").unwrap();
        let cache = MatchCache::new(store);

        assert!(cache.load_if_fresh(NOW).is_none());
    }

    #[test]
    fn test_entry_is_stored_as_data_and_timestamp() {
        let store = SharedStore::default();
        let cache = MatchCache::new(store.clone());

        cache.save(&sample_matches(), NOW);

        let raw = store.get(CACHE_KEY).unwrap().expect("entry should be stored");
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["timestamp"], json!(NOW));
        assert_eq!(value["data"].as_array().map(Vec::len), Some(2));
        assert_eq!(value["data"][1]["elapsed"], json!("HT"));
    }

    #[test]
    fn test_broken_store_never_propagates() {
        let cache = MatchCache::new(BrokenStore);

        cache.save(&sample_matches(), NOW);
        assert!(cache.load_if_fresh(NOW).is_none());
        cache.clear();
    }

    #[test]
    fn test_clear_removes_entry() {
        let cache = MatchCache::new(MemoryStore::new());
        cache.save(&sample_matches(), NOW);

        cache.clear();

        assert!(cache.load_if_fresh(NOW).is_none());
    }

    #[test]
    fn test_file_backed_cache_survives_new_instance() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let matches = sample_matches();

        MatchCache::new(FileStore::with_dir(temp_dir.path().to_path_buf())).save(&matches, NOW);
        let reopened = MatchCache::new(FileStore::with_dir(temp_dir.path().to_path_buf()));

        assert_eq!(reopened.load_if_fresh(NOW + 1_000), Some(matches));
    }
}
