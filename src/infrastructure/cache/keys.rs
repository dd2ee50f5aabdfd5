//! Cache key scheme.
//!
//! Every subsystem derives its keys from this module, so the namespace
//! layout lives in exactly one place:
//!
//! - `geo:details:<ip>` - full [`GeoDetails`] JSON
//! - `geo:<ip>` - legacy country-only entries (kept populated for older readers)
//! - `reachability:<b64url(url)>` - probe verdict JSON
//! - `qr:<sha256(url)>:<size>:<ext>` - rendered QR images
//! - `stats:url:<id>:{total,countries,cities}` - per-URL counters
//! - `stats:system:{total,countries,cities}` - system-wide counters
//!
//! [`GeoDetails`]: crate::domain::entities::GeoDetails

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use sha2::{Digest, Sha256};

use crate::domain::entities::CanonicalUrl;

pub fn geo_details(ip: &str) -> String {
    format!("geo:details:{ip}")
}

/// Legacy country-only key written by older geo writers. New writers still
/// populate it during the cache migration.
pub fn geo_country(ip: &str) -> String {
    format!("geo:{ip}")
}

/// Reachability verdict key. The URL is base64url-encoded so arbitrary URL
/// characters never collide with the key namespace separator.
pub fn reachability(url: &CanonicalUrl) -> String {
    format!("reachability:{}", URL_SAFE_NO_PAD.encode(url.as_str()))
}

pub fn qr(url: &str, size: u32, ext: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    format!("qr:{hex}:{size}:{ext}")
}

pub fn url_total(short_url_id: &str) -> String {
    format!("stats:url:{short_url_id}:total")
}

pub fn url_countries(short_url_id: &str) -> String {
    format!("stats:url:{short_url_id}:countries")
}

pub fn url_cities(short_url_id: &str) -> String {
    format!("stats:url:{short_url_id}:cities")
}

pub fn system_total() -> String {
    "stats:system:total".to_string()
}

pub fn system_countries() -> String {
    "stats:system:countries".to_string()
}

pub fn system_cities() -> String {
    "stats:system:cities".to_string()
}

/// Hash field for a city counter: `city|CC` when the country is known,
/// the bare city name otherwise.
pub fn city_field(city: &str, country_code: Option<&str>) -> String {
    match country_code {
        Some(cc) if !cc.is_empty() => format!("{city}|{cc}"),
        _ => city.to_string(),
    }
}
