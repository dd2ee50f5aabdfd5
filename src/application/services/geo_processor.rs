//! Click enrichment: geolocation resolution, persistence, and counters.
//!
//! Resolution order: private/blank shortcut, detail cache, legacy
//! country-only cache, primary provider, fallback provider. Both positive
//! and negative outcomes are cached under both key generations, keeping
//! older country-only readers working during the cache migration.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::entities::{ClickEvent, ClickInfo, GeoDetails};
use crate::domain::repositories::{AggregateStore, ClickRepository};
use crate::error::AppError;
use crate::infrastructure::cache::{keys, KeyValueCache};
use crate::infrastructure::probes::GeoProvider;

/// Country stored for clicks whose IP could not be resolved.
pub const UNKNOWN_COUNTRY: &str = "Unknown";

pub struct GeoProcessor {
    cache: Arc<dyn KeyValueCache>,
    primary: Arc<dyn GeoProvider>,
    fallback: Arc<dyn GeoProvider>,
    clicks: Arc<dyn ClickRepository>,
    aggregates: Arc<dyn AggregateStore>,
    /// TTL for successful lookups (`geo.cache-ttl-days`).
    positive_ttl: Duration,
    /// TTL for negative entries (`geo.unknown-ttl-minutes`).
    negative_ttl: Duration,
}

impl GeoProcessor {
    pub fn new(
        cache: Arc<dyn KeyValueCache>,
        primary: Arc<dyn GeoProvider>,
        fallback: Arc<dyn GeoProvider>,
        clicks: Arc<dyn ClickRepository>,
        aggregates: Arc<dyn AggregateStore>,
        positive_ttl: Duration,
        negative_ttl: Duration,
    ) -> Self {
        Self {
            cache,
            primary,
            fallback,
            clicks,
            aggregates,
            positive_ttl,
            negative_ttl,
        }
    }

    /// Enriches and persists one click, then bumps the aggregate counters.
    ///
    /// Counters are incremented at most once per call; a failed click write
    /// aborts before any increment (under-count over over-count).
    ///
    /// # Errors
    ///
    /// Returns the click-repository error; counter failures are logged and
    /// swallowed.
    pub async fn process(&self, event: ClickEvent) -> Result<(), AppError> {
        let details = self.resolve(event.ip.as_deref()).await;

        let country = match details.country_code.as_deref() {
            Some(code) if details.has_country() => code.to_string(),
            _ => UNKNOWN_COUNTRY.to_string(),
        };

        let short_url_id = event.short_url_id.clone();
        let info = ClickInfo::from_event(event, country.clone());
        self.clicks.record(info).await?;

        if let Err(e) = self.aggregates.incr_total(&short_url_id).await {
            warn!(short_url_id = %short_url_id, error = %e, "Failed to increment click totals");
        }

        if details.has_country() {
            let code = country.as_str();
            if let Err(e) = self.aggregates.incr_country(&short_url_id, code).await {
                warn!(short_url_id = %short_url_id, error = %e, "Failed to increment country counters");
            }
        }

        if let Some(city) = details.city.as_deref() {
            let country_code = details.has_country().then_some(country.as_str());
            let field = keys::city_field(city, country_code);
            if let Err(e) = self.aggregates.incr_city(&short_url_id, &field).await {
                warn!(short_url_id = %short_url_id, error = %e, "Failed to increment city counters");
            }
        }

        Ok(())
    }

    /// Resolves an IP to geo details, consulting caches before providers.
    pub async fn resolve(&self, ip: Option<&str>) -> GeoDetails {
        let Some(ip) = ip.map(str::trim).filter(|s| !s.is_empty()) else {
            return GeoDetails::unknown();
        };

        if bypasses_lookup(ip) {
            debug!(ip, "Private or unroutable IP, skipping geo lookup");
            return GeoDetails::unknown();
        }

        let details_key = keys::geo_details(ip);
        if let Ok(Some(raw)) = self.cache.get(&details_key).await {
            match serde_json::from_str::<GeoDetails>(&raw) {
                Ok(details) => return details,
                Err(_) => {
                    // Unparseable entries are purged so they stop shadowing
                    // the legacy key.
                    let _ = self.cache.delete(&details_key).await;
                }
            }
        }

        if let Ok(Some(country)) = self.cache.get(&keys::geo_country(ip)).await {
            if country != UNKNOWN_COUNTRY && !country.is_empty() {
                return GeoDetails::from_country_code(country);
            }
        }

        match self.primary.lookup(ip).await {
            Ok(details) => {
                self.cache_positive(ip, &details).await;
                return details;
            }
            Err(e) => {
                metrics::counter!("geo_provider_fallback_total").increment(1);
                warn!(ip, provider = self.primary.name(), error = %e, "Primary geo lookup failed");
            }
        }

        match self.fallback.lookup(ip).await {
            Ok(details) => {
                self.cache_positive(ip, &details).await;
                details
            }
            Err(e) => {
                warn!(ip, provider = self.fallback.name(), error = %e, "Fallback geo lookup failed");
                self.cache_negative(ip).await;
                GeoDetails::unknown()
            }
        }
    }

    async fn cache_positive(&self, ip: &str, details: &GeoDetails) {
        if let Ok(json) = serde_json::to_string(details) {
            let _ = self
                .cache
                .put(&keys::geo_details(ip), &json, self.positive_ttl)
                .await;
        }

        let legacy = match details.country_code.as_deref() {
            Some(code) if details.has_country() => code,
            _ => UNKNOWN_COUNTRY,
        };
        let _ = self
            .cache
            .put(&keys::geo_country(ip), legacy, self.positive_ttl)
            .await;
    }

    /// Negative entries store the sentinel under both key generations, so
    /// repeated failures don't hammer the providers until the TTL lapses.
    async fn cache_negative(&self, ip: &str) {
        if let Ok(json) = serde_json::to_string(&GeoDetails::unknown()) {
            let _ = self
                .cache
                .put(&keys::geo_details(ip), &json, self.negative_ttl)
                .await;
        }
        let _ = self
            .cache
            .put(&keys::geo_country(ip), UNKNOWN_COUNTRY, self.negative_ttl)
            .await;
    }
}

/// Blank, loopback, RFC 1918, and unparseable addresses never reach a
/// provider.
fn bypasses_lookup(ip: &str) -> bool {
    match ip.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => {
            let octets = v4.octets();
            v4.is_loopback()
                || octets[0] == 10
                || (octets[0] == 192 && octets[1] == 168)
                || (octets[0] == 172 && (16..=31).contains(&octets[1]))
        }
        Ok(IpAddr::V6(v6)) => v6.is_loopback(),
        Err(_) => true,
    }
}
