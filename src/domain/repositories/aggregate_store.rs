//! Aggregate counter storage for O(1) click analytics.

use async_trait::async_trait;

use crate::error::AppError;

/// Monotonic counters kept per short URL and system-wide.
///
/// Each operation increments both scopes atomically per key (KV `INCR` /
/// `HINCRBY`), so concurrent clicks compose without loss. Under-counting is
/// tolerated on storage failure; callers must never retry a partially applied
/// increment (over-count is not).
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::RedisAggregateStore`]
/// - [`crate::infrastructure::persistence::InMemoryAggregateStore`]
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AggregateStore: Send + Sync {
    /// Increments the per-URL and system-wide click totals by one.
    async fn incr_total(&self, short_url_id: &str) -> Result<(), AppError>;

    /// Increments the per-URL and system-wide counters for a country code.
    async fn incr_country(&self, short_url_id: &str, country_code: &str) -> Result<(), AppError>;

    /// Increments the per-URL and system-wide counters for a city key
    /// (`city|CC` when the country is known).
    async fn incr_city(&self, short_url_id: &str, city_key: &str) -> Result<(), AppError>;
}
