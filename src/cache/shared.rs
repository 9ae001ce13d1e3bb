//! Shared Cache Module
//!
//! Thread-safe cache handle: one exclusive lock around the whole `LruStore`,
//! plus the TTL reclaimer when TTL mode is on.

use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::cache::{CacheStats, LruStore};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::tasks::Reclaimer;

/// Locks a shared store.
///
/// Every operation takes this lock, including `get` (it reorders the list) and
/// `contains`. A poisoned lock is recovered since store operations leave the
/// structure consistent before any point that can panic.
pub(crate) fn lock_store<K, V>(store: &Mutex<LruStore<K, V>>) -> MutexGuard<'_, LruStore<K, V>> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

// == LRU Cache ==
/// A thread-safe, fixed-capacity LRU cache with optional per-entry TTL.
///
/// Share it between threads with `Arc<LruCache<K, V>>`. Values are cloned
/// out on `get`, so cheap-to-clone values (or `Arc`s) work best.
///
/// # Example
/// ```
/// use ttl_lru::LruCache;
///
/// let cache = LruCache::new(2).unwrap();
/// cache.set("a", 1).unwrap();
/// cache.set("b", 2).unwrap();
/// cache.get(&"a");
/// cache.set("c", 3).unwrap(); // evicts "b"
///
/// assert!(cache.contains(&"a"));
/// assert!(!cache.contains(&"b"));
/// ```
#[derive(Debug)]
pub struct LruCache<K, V> {
    store: Arc<Mutex<LruStore<K, V>>>,
    reclaimer: Mutex<Option<Reclaimer>>,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    // == Constructors ==
    /// Creates a cache without TTL mode.
    ///
    /// # Errors
    /// `InvalidCapacity` when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        Self::from_config(&CacheConfig::new(capacity))
    }

    /// Creates a cache with TTL mode and the default sweep interval.
    ///
    /// Must be called from within a tokio runtime, which hosts the reclaimer.
    pub fn with_expiry(capacity: usize) -> Result<Self> {
        Self::from_config(&CacheConfig::new(capacity).with_ttl(true))
    }

    /// Creates a cache from a config, starting the reclaimer if TTL mode is on.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        let store = Arc::new(Mutex::new(LruStore::from_config(config)?));
        let reclaimer = if config.ttl_enabled {
            Some(Reclaimer::spawn(&store, config.reclaim_interval)?)
        } else {
            None
        };

        Ok(Self {
            store,
            reclaimer: Mutex::new(reclaimer),
        })
    }

    // == Operations ==
    /// Checks whether `key` is resident. Does not change recency order.
    pub fn contains(&self, key: &K) -> bool {
        self.lock().contains(key, Instant::now())
    }

    /// Returns a clone of the value and marks the key most recently used.
    pub fn get(&self, key: &K) -> Option<V> {
        self.lock().get(key, Instant::now())
    }

    /// Inserts or overwrites `key`, evicting the least recently used entry
    /// when the cache is full.
    ///
    /// # Errors
    /// `TtlRequired` on a cache built with TTL mode.
    pub fn set(&self, key: K, value: V) -> Result<()> {
        self.lock().set(key, value)
    }

    /// Like `set`, with an entry that expires `ttl` from now.
    ///
    /// # Errors
    /// `TtlDisabled` on a cache built without TTL mode.
    pub fn set_with_expiry(&self, key: K, value: V, ttl: Duration) -> Result<()> {
        self.lock().set_with_expiry(key, value, ttl, Instant::now())
    }

    /// Removes `key`, returning whether it was resident.
    pub fn del(&self, key: &K) -> bool {
        self.lock().del(key, Instant::now())
    }

    /// Runs one expiry sweep now and returns the number of entries removed.
    pub fn purge_expired(&self) -> usize {
        self.lock().purge_expired(Instant::now())
    }

    /// Snapshot of resident pairs from most to least recently used.
    pub fn entries(&self) -> Vec<(K, V)> {
        self.lock().entries(Instant::now())
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats()
    }

    /// Resident entry count, including expired entries not yet removed.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity()
    }

    pub fn is_ttl_enabled(&self) -> bool {
        self.lock().is_ttl_enabled()
    }

    // == Lifecycle ==
    pub fn is_reclaimer_running(&self) -> bool {
        self.reclaimer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(Reclaimer::is_running)
    }

    /// Stops the reclaimer and waits for it to exit.
    ///
    /// Safe to call more than once. The cache stays usable afterwards, but
    /// expired entries are only removed by reads and `purge_expired`.
    pub async fn shutdown(&self) {
        let reclaimer = self
            .reclaimer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(reclaimer) = reclaimer {
            reclaimer.shutdown().await;
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruStore<K, V>> {
        lock_store(&self.store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;
    use std::thread;

    #[test]
    fn test_cache_rejects_zero_capacity() {
        let result = LruCache::<u32, u32>::new(0);
        assert!(matches!(result, Err(CacheError::InvalidCapacity(0))));
    }

    #[test]
    fn test_cache_with_expiry_needs_runtime() {
        let result = LruCache::<u32, u32>::with_expiry(4);
        assert!(matches!(result, Err(CacheError::RuntimeUnavailable)));
    }

    #[test]
    fn test_cache_without_ttl_has_no_reclaimer() {
        let cache = LruCache::<u32, u32>::new(4).unwrap();
        assert!(!cache.is_ttl_enabled());
        assert!(!cache.is_reclaimer_running());
        assert_eq!(cache.capacity(), 4);
    }

    #[test]
    fn test_concurrent_writers_and_readers_stay_consistent() {
        let cache = Arc::new(LruCache::<u32, u32>::new(16).unwrap());

        let workers: Vec<_> = (0..8u32)
            .map(|worker| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..2_000u32 {
                        // Overlapping key space across workers
                        let key = (worker * 7 + i) % 40;
                        match i % 4 {
                            0 | 1 => cache.set(key, worker).unwrap(),
                            2 => {
                                cache.get(&key);
                            }
                            _ => {
                                cache.del(&key);
                            }
                        }
                        assert!(cache.len() <= 16);
                    }
                })
            })
            .collect();

        for worker in workers {
            worker.join().expect("worker panicked");
        }

        cache.lock().assert_consistent();
        assert_eq!(cache.entries().len(), cache.len());
    }

    #[test]
    fn test_poisoned_lock_is_recovered() {
        let cache = Arc::new(LruCache::<u32, u32>::new(4).unwrap());
        cache.set(1, 1).unwrap();

        let poisoner = Arc::clone(&cache);
        let _ = thread::spawn(move || {
            let _guard = poisoner.lock();
            panic!("poison the lock");
        })
        .join();

        assert_eq!(cache.get(&1), Some(1));
        cache.set(2, 2).unwrap();
        cache.lock().assert_consistent();
    }

    #[tokio::test]
    async fn test_cache_with_expiry_starts_and_stops_reclaimer() {
        let cache = LruCache::<u32, u32>::with_expiry(4).unwrap();
        assert!(cache.is_ttl_enabled());
        assert!(cache.is_reclaimer_running());

        cache.shutdown().await;
        assert!(!cache.is_reclaimer_running());

        // Second shutdown is a no-op
        cache.shutdown().await;

        // Still usable after shutdown
        cache
            .set_with_expiry(1, 1, Duration::from_secs(60))
            .unwrap();
        assert_eq!(cache.get(&1), Some(1));
    }

    #[tokio::test]
    async fn test_cache_ttl_sweep() {
        let config = CacheConfig::new(8)
            .with_ttl(true)
            .with_reclaim_interval(Duration::from_millis(100))
            .with_expire_on_read(false);
        let cache = LruCache::<u32, u32>::from_config(&config).unwrap();

        cache.set_with_expiry(1, 1, Duration::from_millis(50)).unwrap();
        cache.set_with_expiry(2, 2, Duration::from_secs(60)).unwrap();

        tokio::time::sleep(Duration::from_millis(400)).await;

        assert!(!cache.contains(&1));
        assert!(cache.contains(&2));
        cache.lock().assert_consistent();
        cache.shutdown().await;
    }
}
