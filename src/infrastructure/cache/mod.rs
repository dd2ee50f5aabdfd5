//! Caching layer over an external KV store with TTLs.
//!
//! Provides a [`KeyValueCache`] trait with two implementations:
//! - [`RedisCache`] - Production Redis-backed cache
//! - [`NullCache`] - No-op implementation for testing/disabled caching
//!
//! Key construction for every namespace lives in [`keys`].

pub mod keys;
mod null_cache;
mod redis_cache;
mod service;

pub use null_cache::NullCache;
pub use redis_cache::RedisCache;
pub use service::{CacheError, CacheResult, KeyValueCache};

#[cfg(test)]
pub use service::MockKeyValueCache;
