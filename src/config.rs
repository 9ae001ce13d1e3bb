//! Configuration Module
//!
//! Handles loading and validating cache configuration, either built in code or
//! read from environment variables.

use std::env;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Default interval between two TTL sweeps.
pub const DEFAULT_RECLAIM_INTERVAL: Duration = Duration::from_secs(5);

/// Default maximum number of resident entries.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of entries the cache can hold
    pub capacity: usize,
    /// Whether entries carry a deadline and the reclaimer runs
    pub ttl_enabled: bool,
    /// Interval between two reclaimer sweeps
    pub reclaim_interval: Duration,
    /// Whether reads treat an expired entry as absent before the next sweep
    pub expire_on_read: bool,
}

impl CacheConfig {
    /// Creates a config with the given capacity and defaults for everything else.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    pub fn with_ttl(mut self, enabled: bool) -> Self {
        self.ttl_enabled = enabled;
        self
    }

    pub fn with_reclaim_interval(mut self, interval: Duration) -> Self {
        self.reclaim_interval = interval;
        self
    }

    pub fn with_expire_on_read(mut self, enabled: bool) -> Self {
        self.expire_on_read = enabled;
        self
    }

    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `LRU_CAPACITY` - Maximum cache entries (default: 1000)
    /// - `LRU_TTL_ENABLED` - Enable per-entry expiry (default: false)
    /// - `LRU_RECLAIM_INTERVAL_MS` - Sweep frequency in milliseconds (default: 5000)
    /// - `LRU_EXPIRE_ON_READ` - Hide expired entries from reads (default: true)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            capacity: parse_env("LRU_CAPACITY").unwrap_or(defaults.capacity),
            ttl_enabled: parse_env("LRU_TTL_ENABLED").unwrap_or(defaults.ttl_enabled),
            reclaim_interval: parse_env("LRU_RECLAIM_INTERVAL_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.reclaim_interval),
            expire_on_read: parse_env("LRU_EXPIRE_ON_READ").unwrap_or(defaults.expire_on_read),
        }
    }

    /// Checks the values that would make the cache unusable.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(CacheError::InvalidCapacity(self.capacity));
        }
        if self.ttl_enabled && self.reclaim_interval.is_zero() {
            return Err(CacheError::InvalidReclaimInterval);
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            ttl_enabled: false,
            reclaim_interval: DEFAULT_RECLAIM_INTERVAL,
            expire_on_read: true,
        }
    }
}

/// Reads and parses an environment variable, `None` when unset or malformed.
pub fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.capacity, 1000);
        assert!(!config.ttl_enabled);
        assert_eq!(config.reclaim_interval, Duration::from_secs(5));
        assert!(config.expire_on_read);
    }

    #[test]
    fn test_config_from_env() {
        // Single test touches the environment so parallel tests cannot race on it
        env::remove_var("LRU_CAPACITY");
        env::remove_var("LRU_TTL_ENABLED");
        env::remove_var("LRU_RECLAIM_INTERVAL_MS");
        env::remove_var("LRU_EXPIRE_ON_READ");
        assert_eq!(CacheConfig::from_env(), CacheConfig::default());

        env::set_var("LRU_CAPACITY", "64");
        env::set_var("LRU_TTL_ENABLED", "true");
        env::set_var("LRU_RECLAIM_INTERVAL_MS", "250");
        env::set_var("LRU_EXPIRE_ON_READ", "not-a-bool");
        let config = CacheConfig::from_env();
        assert_eq!(config.capacity, 64);
        assert!(config.ttl_enabled);
        assert_eq!(config.reclaim_interval, Duration::from_millis(250));
        assert!(config.expire_on_read);

        env::remove_var("LRU_CAPACITY");
        env::remove_var("LRU_TTL_ENABLED");
        env::remove_var("LRU_RECLAIM_INTERVAL_MS");
        env::remove_var("LRU_EXPIRE_ON_READ");
    }

    #[test]
    fn test_config_builder() {
        let config = CacheConfig::new(10)
            .with_ttl(true)
            .with_reclaim_interval(Duration::from_millis(100))
            .with_expire_on_read(false);

        assert_eq!(config.capacity, 10);
        assert!(config.ttl_enabled);
        assert_eq!(config.reclaim_interval, Duration::from_millis(100));
        assert!(!config.expire_on_read);
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        assert_eq!(
            CacheConfig::new(0).validate(),
            Err(CacheError::InvalidCapacity(0))
        );
    }

    #[test]
    fn test_validate_rejects_zero_interval_only_with_ttl() {
        let config = CacheConfig::new(4).with_reclaim_interval(Duration::ZERO);
        assert!(config.validate().is_ok());
        assert_eq!(
            config.with_ttl(true).validate(),
            Err(CacheError::InvalidReclaimInterval)
        );
    }
}
