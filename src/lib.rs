//! ttl_lru - A fixed-capacity LRU cache with optional per-entry TTL
//!
//! Provides O(1) get/set/del/contains behind a single lock, LRU eviction at a
//! hard entry-count capacity, and a background reclaimer for expired entries.

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{CacheStats, LruCache, LruStore};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
