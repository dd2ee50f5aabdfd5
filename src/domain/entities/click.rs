//! Click tracking events and their persisted form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event published on every successful redirect.
///
/// Emission is fire-and-forget from the redirect path; enrichment and
/// persistence happen on the geo worker pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickEvent {
    pub short_url_id: String,
    pub ip: Option<String>,
    pub referrer: Option<String>,
    pub browser: Option<String>,
    pub platform: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ClickEvent {
    pub fn new(
        short_url_id: impl Into<String>,
        ip: Option<String>,
        referrer: Option<String>,
        browser: Option<String>,
        platform: Option<String>,
    ) -> Self {
        Self {
            short_url_id: short_url_id.into(),
            ip,
            referrer,
            browser,
            platform,
            timestamp: Utc::now(),
        }
    }
}

/// A click event enriched with the resolved country, ready for persistence.
///
/// `country` is always populated: unresolvable IPs store `"Unknown"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickInfo {
    pub short_url_id: String,
    pub country: String,
    pub ip: Option<String>,
    pub referrer: Option<String>,
    pub browser: Option<String>,
    pub platform: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ClickInfo {
    /// Builds the persisted record from an event and its resolved country.
    pub fn from_event(event: ClickEvent, country: impl Into<String>) -> Self {
        Self {
            short_url_id: event.short_url_id,
            country: country.into(),
            ip: event.ip,
            referrer: event.referrer,
            browser: event.browser,
            platform: event.platform,
            timestamp: event.timestamp,
        }
    }
}
