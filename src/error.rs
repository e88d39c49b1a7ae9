//! Error types for the cache subsystem and the delivery hot path
//!
//! The cache taxonomy keeps misses, transport failures and timeouts apart:
//! a miss drives fallback to the next tier, everything else is counted and
//! degraded. Delivery errors are the only ones a caller ever sees.

use std::time::Duration;

use thiserror::Error;

/// Errors produced by the cache tiers.
///
/// A [`CacheError::Miss`] is the normal "no entry" signal and never reaches
/// a caller of the delivery API; the remaining variants are recorded in the
/// error counter and swallowed below the hybrid cache's public contract.
#[derive(Error, Debug)]
pub enum CacheError {
    /// No entry for the requested key (absent or expired).
    #[error("cache miss")]
    Miss,

    /// Shared-tier network or protocol failure.
    #[error("cache transport error: {0}")]
    Transport(String),

    /// Payload could not be encoded or decoded.
    #[error("cache serialization error: {0}")]
    Serialization(String),

    /// A shared-tier operation exceeded its deadline.
    #[error("cache operation timed out after {0:?}")]
    Timeout(Duration),

    /// Invalid cache configuration or failed bootstrap ping.
    #[error("cache configuration error: {0}")]
    Config(String),
}

impl CacheError {
    /// True for the typed miss signal, as opposed to a real failure.
    pub fn is_miss(&self) -> bool {
        matches!(self, CacheError::Miss)
    }
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}

/// Result type alias for cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Caller-visible errors of the delivery service.
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// Malformed request; the message is stable and safe to surface.
    #[error("{0}")]
    Validation(String),

    /// Source-of-truth failure, deliberately generic to avoid leaking
    /// internal details.
    #[error("failed to retrieve campaigns")]
    Retrieval,
}

impl DeliveryError {
    pub fn is_validation(&self) -> bool {
        matches!(self, DeliveryError::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_error_display() {
        assert_eq!(CacheError::Miss.to_string(), "cache miss");

        let err = CacheError::Transport("connection refused".to_string());
        assert!(err.to_string().contains("connection refused"));

        let err = CacheError::Timeout(Duration::from_secs(2));
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_cache_error_is_miss() {
        assert!(CacheError::Miss.is_miss());
        assert!(!CacheError::Transport("boom".to_string()).is_miss());
    }

    #[test]
    fn test_delivery_error_display() {
        let err = DeliveryError::Validation("country is required".to_string());
        assert_eq!(err.to_string(), "country is required");
        assert!(err.is_validation());

        assert_eq!(
            DeliveryError::Retrieval.to_string(),
            "failed to retrieve campaigns"
        );
        assert!(!DeliveryError::Retrieval.is_validation());
    }
}
