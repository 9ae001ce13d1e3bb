//! Cache Module
//!
//! Provides in-memory caching with LRU eviction and optional TTL expiration.

mod entry;
mod lru;
mod shared;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use lru::RecencyList;
pub use shared::LruCache;
pub use stats::CacheStats;
pub use store::LruStore;

pub(crate) use shared::lock_store;
