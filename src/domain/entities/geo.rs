//! Geolocation details resolved from a click IP address.

use serde::{Deserialize, Serialize};

/// Country code used when no provider could resolve an IP.
pub const UNKNOWN_COUNTRY_CODE: &str = "XX";

/// Geographic and network information for one IP address.
///
/// Every field is optional: providers disagree on coverage, and the legacy
/// country-only cache yields entries with nothing but `country_code`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoDetails {
    pub country_code: Option<String>,
    pub country_name: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timezone: Option<String>,
    pub isp: Option<String>,
    pub organization: Option<String>,
}

impl GeoDetails {
    /// Sentinel value for unresolvable IPs (`country_code = "XX"`).
    pub fn unknown() -> Self {
        Self {
            country_code: Some(UNKNOWN_COUNTRY_CODE.to_string()),
            ..Self::default()
        }
    }

    /// Synthesizes details from a legacy cache entry that carries only a
    /// country code.
    pub fn from_country_code(country_code: impl Into<String>) -> Self {
        Self {
            country_code: Some(country_code.into()),
            ..Self::default()
        }
    }

    /// Whether this value carries a usable country code (non-empty, not the
    /// `"XX"` sentinel).
    pub fn has_country(&self) -> bool {
        match self.country_code.as_deref() {
            Some("") | Some(UNKNOWN_COUNTRY_CODE) | None => false,
            Some(_) => true,
        }
    }
}
