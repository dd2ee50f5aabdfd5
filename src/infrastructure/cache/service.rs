//! Cache service trait and error types.

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

/// Errors that can occur during cache operations.
#[derive(Debug)]
pub enum CacheError {
    ConnectionError(String),
    OperationError(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ConnectionError(e) => write!(f, "Cache connection error: {}", e),
            Self::OperationError(e) => write!(f, "Cache operation error: {}", e),
        }
    }
}

impl std::error::Error for CacheError {}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Typed key-value cache with per-entry TTLs.
///
/// Values are UTF-8 strings; structured entries are stored as JSON and
/// decoded by the caller. Keys follow the scheme in
/// [`crate::infrastructure::cache::keys`].
///
/// Failures are non-fatal to callers: implementations treat a failed read as
/// a miss and log-and-swallow failed writes, so production implementations
/// never return `Err` from these methods.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed with TTL support
/// - [`crate::infrastructure::cache::NullCache`] - no-op for disabled caching
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    /// Retrieves a value by key.
    ///
    /// Returns `Ok(None)` on miss or on backend error (fail-open).
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Stores a value under `key` for `ttl`.
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    /// Removes a key. Used when a cached entry turns out to be unparseable.
    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Checks if the cache backend is healthy.
    async fn health_check(&self) -> bool;
}
