//! Redis-backed aggregate counters.
//!
//! Totals are plain `INCR` keys; country and city breakdowns are hashes
//! updated with `HINCRBY`. Both scopes (per-URL and system-wide) are bumped
//! in one pipeline per operation.

use async_trait::async_trait;
use redis::{aio::ConnectionManager, Client};

use crate::domain::repositories::AggregateStore;
use crate::error::AppError;
use crate::infrastructure::cache::keys;

pub struct RedisAggregateStore {
    client: ConnectionManager,
}

impl RedisAggregateStore {
    /// Connects to Redis and validates the connection with a PING.
    pub async fn connect(redis_url: &str) -> Result<Self, AppError> {
        let client = Client::open(redis_url)
            .map_err(|e| AppError::internal(format!("invalid Redis URL: {e}")))?;
        let manager = ConnectionManager::new(client).await?;

        let mut test_conn = manager.clone();
        redis::cmd("PING").query_async::<()>(&mut test_conn).await?;

        Ok(Self { client: manager })
    }
}

#[async_trait]
impl AggregateStore for RedisAggregateStore {
    async fn incr_total(&self, short_url_id: &str) -> Result<(), AppError> {
        let mut conn = self.client.clone();
        let mut pipe = redis::pipe();
        pipe.incr(keys::url_total(short_url_id), 1i64)
            .incr(keys::system_total(), 1i64);
        pipe.query_async::<()>(&mut conn).await?;
        Ok(())
    }

    async fn incr_country(&self, short_url_id: &str, country_code: &str) -> Result<(), AppError> {
        let mut conn = self.client.clone();
        let mut pipe = redis::pipe();
        pipe.hincr(keys::url_countries(short_url_id), country_code, 1i64)
            .hincr(keys::system_countries(), country_code, 1i64);
        pipe.query_async::<()>(&mut conn).await?;
        Ok(())
    }

    async fn incr_city(&self, short_url_id: &str, city_key: &str) -> Result<(), AppError> {
        let mut conn = self.client.clone();
        let mut pipe = redis::pipe();
        pipe.hincr(keys::url_cities(short_url_id), city_key, 1i64)
            .hincr(keys::system_cities(), city_key, 1i64);
        pipe.query_async::<()>(&mut conn).await?;
        Ok(())
    }
}
