//! In-memory aggregate counters for tests and single-process runs.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::repositories::AggregateStore;
use crate::error::AppError;

#[derive(Default)]
struct Counters {
    totals: HashMap<String, u64>,
    countries: HashMap<String, HashMap<String, u64>>,
    cities: HashMap<String, HashMap<String, u64>>,
}

/// System-wide counters are stored under this pseudo-id.
const SYSTEM: &str = "__system__";

#[derive(Default)]
pub struct InMemoryAggregateStore {
    counters: Mutex<Counters>,
}

impl InMemoryAggregateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Counters> {
        self.counters.lock().expect("aggregate lock poisoned")
    }

    pub fn total(&self, short_url_id: &str) -> u64 {
        self.lock().totals.get(short_url_id).copied().unwrap_or(0)
    }

    pub fn system_total(&self) -> u64 {
        self.total(SYSTEM)
    }

    pub fn country_count(&self, short_url_id: &str, country_code: &str) -> u64 {
        self.lock()
            .countries
            .get(short_url_id)
            .and_then(|m| m.get(country_code))
            .copied()
            .unwrap_or(0)
    }

    pub fn system_country_count(&self, country_code: &str) -> u64 {
        self.country_count(SYSTEM, country_code)
    }

    pub fn city_count(&self, short_url_id: &str, city_key: &str) -> u64 {
        self.lock()
            .cities
            .get(short_url_id)
            .and_then(|m| m.get(city_key))
            .copied()
            .unwrap_or(0)
    }

    pub fn system_city_count(&self, city_key: &str) -> u64 {
        self.city_count(SYSTEM, city_key)
    }
}

#[async_trait]
impl AggregateStore for InMemoryAggregateStore {
    async fn incr_total(&self, short_url_id: &str) -> Result<(), AppError> {
        let mut counters = self.lock();
        *counters.totals.entry(short_url_id.to_string()).or_insert(0) += 1;
        *counters.totals.entry(SYSTEM.to_string()).or_insert(0) += 1;
        Ok(())
    }

    async fn incr_country(&self, short_url_id: &str, country_code: &str) -> Result<(), AppError> {
        let mut counters = self.lock();
        for scope in [short_url_id, SYSTEM] {
            *counters
                .countries
                .entry(scope.to_string())
                .or_default()
                .entry(country_code.to_string())
                .or_insert(0) += 1;
        }
        Ok(())
    }

    async fn incr_city(&self, short_url_id: &str, city_key: &str) -> Result<(), AppError> {
        let mut counters = self.lock();
        for scope in [short_url_id, SYSTEM] {
            *counters
                .cities
                .entry(scope.to_string())
                .or_default()
                .entry(city_key.to_string())
                .or_insert(0) += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_totals_increment_both_scopes() {
        let store = InMemoryAggregateStore::new();
        store.incr_total("abc").await.unwrap();
        store.incr_total("abc").await.unwrap();
        store.incr_total("xyz").await.unwrap();

        assert_eq!(store.total("abc"), 2);
        assert_eq!(store.total("xyz"), 1);
        assert_eq!(store.system_total(), 3);
    }

    #[tokio::test]
    async fn test_country_and_city_breakdowns() {
        let store = InMemoryAggregateStore::new();
        store.incr_country("abc", "US").await.unwrap();
        store.incr_country("abc", "US").await.unwrap();
        store.incr_city("abc", "Mountain View|US").await.unwrap();

        assert_eq!(store.country_count("abc", "US"), 2);
        assert_eq!(store.system_country_count("US"), 2);
        assert_eq!(store.city_count("abc", "Mountain View|US"), 1);
        assert_eq!(store.system_city_count("Mountain View|US"), 1);
    }
}
