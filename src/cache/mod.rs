//! Cache module for keeping the last live-match list across runs
//!
//! `MatchCache` stores the most recent successful fetch with its capture
//! time and serves it only within a one-hour freshness window. Storage is an
//! injected `KeyValueStore`, so the cache logic runs the same against files
//! on disk or an in-memory map.

mod manager;
mod store;

pub use manager::{MatchCache, CACHE_KEY, FRESHNESS_WINDOW_MS};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
