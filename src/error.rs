//! Error types for the cache
//!
//! Provides unified error handling using thiserror. A missing key is never an
//! error: lookups report absence through `Option` or `bool`.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache construction and misuse.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Capacity must be at least one entry
    #[error("Invalid capacity: {0} (must be greater than zero)")]
    InvalidCapacity(usize),

    /// TTL mode needs a non-zero sweep interval
    #[error("Invalid reclaim interval: must be greater than zero")]
    InvalidReclaimInterval,

    /// Expiry-bearing write on a cache built without TTL mode
    #[error("TTL mode is disabled for this cache; use set instead of set_with_expiry")]
    TtlDisabled,

    /// Expiry-less write on a cache built with TTL mode
    #[error("TTL mode is enabled for this cache; use set_with_expiry instead of set")]
    TtlRequired,

    /// The deadline computed from the TTL cannot be represented
    #[error("TTL of {0:?} overflows the clock")]
    TtlOverflow(std::time::Duration),

    /// TTL mode needs a tokio runtime to host the reclaimer
    #[error("No tokio runtime available to spawn the TTL reclaimer")]
    RuntimeUnavailable,
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            CacheError::InvalidCapacity(0).to_string(),
            "Invalid capacity: 0 (must be greater than zero)"
        );
        assert!(CacheError::TtlDisabled.to_string().contains("set_with_expiry"));
        assert!(CacheError::TtlRequired.to_string().contains("set_with_expiry"));
        assert!(CacheError::TtlOverflow(Duration::MAX)
            .to_string()
            .contains("overflows"));
    }
}
