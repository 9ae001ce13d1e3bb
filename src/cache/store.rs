//! Cache Store Module
//!
//! Main cache engine combining a HashMap index with the recency list and TTL
//! expiration. The store is not synchronized; `LruCache` wraps it in a lock.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, RecencyList};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

// == Cache Store ==
/// Single-threaded LRU engine with optional per-entry deadlines.
///
/// Every key in `index` points at a linked slot in `list` and every linked
/// slot is indexed by its key. Operations that depend on the clock take the
/// current `Instant` from the caller.
#[derive(Debug)]
pub struct LruStore<K, V> {
    /// Key to recency list slot
    index: HashMap<K, usize>,
    /// Recency order, head = most recently used
    list: RecencyList<K, V>,
    /// Counters
    stats: CacheStats,
    /// Maximum number of entries allowed
    capacity: usize,
    /// Whether entries carry deadlines
    ttl_enabled: bool,
    /// Whether lookups hide entries past their deadline
    expire_on_read: bool,
}

impl<K, V> LruStore<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    // == Constructor ==
    /// Creates an empty store with the given capacity and no TTL.
    pub fn new(capacity: usize) -> Result<Self> {
        Self::from_config(&CacheConfig::new(capacity))
    }

    /// Creates an empty store from a validated config.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            index: HashMap::with_capacity(config.capacity),
            list: RecencyList::with_capacity(config.capacity),
            stats: CacheStats::new(),
            capacity: config.capacity,
            ttl_enabled: config.ttl_enabled,
            expire_on_read: config.expire_on_read,
        })
    }

    // == Contains ==
    /// Checks whether `key` is resident without touching recency order.
    ///
    /// With read-side expiry on, an entry past its deadline is deleted and
    /// reported absent, so `len`, `entries` and `del` agree with the answer.
    pub fn contains(&mut self, key: &K, now: Instant) -> bool {
        if self.reap_if_expired(key, now) {
            return false;
        }
        self.index.contains_key(key)
    }

    // == Get ==
    /// Retrieves a value by key and promotes it to most recently used.
    ///
    /// With read-side expiry on, an expired entry is deleted and counted as a
    /// miss.
    pub fn get(&mut self, key: &K, now: Instant) -> Option<V> {
        if self.reap_if_expired(key, now) {
            self.stats.record_miss();
            return None;
        }
        let Some(&idx) = self.index.get(key) else {
            self.stats.record_miss();
            return None;
        };

        self.list.move_to_front(idx);
        self.stats.record_hit();
        self.list.get(idx).map(|entry| entry.value.clone())
    }

    // == Set ==
    /// Stores a key-value pair on a cache without TTL mode.
    pub fn set(&mut self, key: K, value: V) -> Result<()> {
        if self.ttl_enabled {
            return Err(CacheError::TtlRequired);
        }
        self.insert(key, value, None);
        Ok(())
    }

    // == Set With Expiry ==
    /// Stores a key-value pair that expires `ttl` after `now`.
    ///
    /// Overwriting a resident key resets its deadline.
    pub fn set_with_expiry(&mut self, key: K, value: V, ttl: Duration, now: Instant) -> Result<()> {
        if !self.ttl_enabled {
            return Err(CacheError::TtlDisabled);
        }
        let deadline = now.checked_add(ttl).ok_or(CacheError::TtlOverflow(ttl))?;
        self.insert(key, value, Some(deadline));
        Ok(())
    }

    // == Delete ==
    /// Removes an entry by key, returning whether it was resident.
    ///
    /// With read-side expiry on, an expired entry is still removed but counts
    /// as absent.
    pub fn del(&mut self, key: &K, now: Instant) -> bool {
        if self.reap_if_expired(key, now) {
            return false;
        }
        self.remove(key)
    }

    // == Purge Expired ==
    /// Removes every entry whose deadline has passed at `now`.
    ///
    /// Walks the list from head to tail and deletes through the same path as
    /// `del`. Returns the number of entries removed.
    pub fn purge_expired(&mut self, now: Instant) -> usize {
        if !self.ttl_enabled {
            return 0;
        }

        let expired: Vec<K> = self
            .list
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(_, entry)| entry.key.clone())
            .collect();

        let removed = expired.iter().filter(|key| self.remove(key)).count();
        self.stats.record_expirations(removed);
        removed
    }

    // == Entries ==
    /// Snapshot of resident pairs from most to least recently used.
    ///
    /// Does not change recency order. With read-side expiry on, pairs past
    /// their deadline are left out.
    pub fn entries(&self, now: Instant) -> Vec<(K, V)> {
        self.list
            .iter()
            .filter(|(_, entry)| !(self.expire_on_read && entry.is_expired_at(now)))
            .map(|(_, entry)| (entry.key.clone(), entry.value.clone()))
            .collect()
    }

    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.list.len());
        stats
    }

    /// Resident entry count, including expired entries not yet removed.
    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_ttl_enabled(&self) -> bool {
        self.ttl_enabled
    }

    /// Updates in place or inserts at head, evicting the tail when full.
    fn insert(&mut self, key: K, value: V, expires_at: Option<Instant>) {
        if let Some(&idx) = self.index.get(&key) {
            if let Some(entry) = self.list.get_mut(idx) {
                entry.value = value;
                entry.expires_at = expires_at;
            }
            self.list.move_to_front(idx);
            return;
        }

        // Evict before inserting so length never exceeds capacity
        if self.list.len() >= self.capacity {
            self.evict_lru();
        }

        let idx = self.list.push_front(CacheEntry::new(key.clone(), value, expires_at));
        self.index.insert(key, idx);
        self.stats.set_total_entries(self.list.len());
    }

    /// Shared delete path for `del`, eviction, expiry on read and sweeps.
    fn remove(&mut self, key: &K) -> bool {
        let Some(idx) = self.index.remove(key) else {
            return false;
        };
        self.list.remove(idx);
        self.stats.set_total_entries(self.list.len());
        true
    }

    /// Deletes `key` if read-side expiry is on and its deadline has passed.
    fn reap_if_expired(&mut self, key: &K, now: Instant) -> bool {
        if !self.expire_on_read {
            return false;
        }
        let expired = self
            .index
            .get(key)
            .and_then(|&idx| self.list.get(idx))
            .is_some_and(|entry| entry.is_expired_at(now));
        if expired && self.remove(key) {
            self.stats.record_expirations(1);
            return true;
        }
        false
    }

    fn evict_lru(&mut self) {
        let Some(key) = self
            .list
            .tail()
            .and_then(|idx| self.list.get(idx))
            .map(|entry| entry.key.clone())
        else {
            return;
        };

        if self.remove(&key) {
            self.stats.record_eviction();
            debug!(capacity = self.capacity, "Evicted least recently used entry");
        }
    }
}

#[cfg(test)]
impl<K, V> LruStore<K, V>
where
    K: Hash + Eq + Clone + std::fmt::Debug,
    V: Clone,
{
    /// Panics unless the index and the recency list describe the same entries.
    pub(crate) fn assert_consistent(&self) {
        self.list.assert_linked();
        assert_eq!(self.index.len(), self.list.len(), "index and list sizes");
        assert!(self.list.len() <= self.capacity, "length exceeds capacity");
        for (idx, entry) in self.list.iter() {
            assert_eq!(
                self.index.get(&entry.key),
                Some(&idx),
                "index slot for {:?}",
                entry.key
            );
        }
    }

    /// Resident keys from most to least recently used.
    pub(crate) fn keys(&self) -> Vec<K> {
        self.list.iter().map(|(_, entry)| entry.key.clone()).collect()
    }
}
