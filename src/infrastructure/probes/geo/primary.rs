//! Primary geolocation provider (`ipapi.co` wire format).

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{expand_path, GeoProvider};
use crate::domain::entities::GeoDetails;
use crate::error::AppError;

/// `ipapi.co`-style JSON payload.
///
/// Errors come back as HTTP 200 with `{"error": true, "reason": "..."}`.
#[derive(Debug, Deserialize)]
struct IpapiResponse {
    #[serde(default)]
    error: bool,
    #[serde(default)]
    reason: Option<String>,
    country_code: Option<String>,
    country_name: Option<String>,
    region: Option<String>,
    city: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    timezone: Option<String>,
    org: Option<String>,
}

impl From<IpapiResponse> for GeoDetails {
    fn from(r: IpapiResponse) -> Self {
        GeoDetails {
            country_code: r.country_code,
            country_name: r.country_name,
            region: r.region,
            city: r.city,
            latitude: r.latitude,
            longitude: r.longitude,
            timezone: r.timezone,
            isp: None,
            organization: r.org,
        }
    }
}

pub struct IpapiProvider {
    client: reqwest::Client,
    base_url: String,
    path: String,
    api_key: Option<String>,
}

impl IpapiProvider {
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        path: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            path: path.into(),
            api_key,
        })
    }
}

#[async_trait]
impl GeoProvider for IpapiProvider {
    fn name(&self) -> &'static str {
        "ipapi"
    }

    async fn lookup(&self, ip: &str) -> Result<GeoDetails, AppError> {
        let url = expand_path(&self.base_url, &self.path, ip);

        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::internal(format!("ipapi request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::internal(format!("ipapi returned {status}")));
        }

        let parsed: IpapiResponse = response
            .json()
            .await
            .map_err(|e| AppError::internal(format!("unparseable ipapi response: {e}")))?;

        if parsed.error {
            let reason = parsed.reason.unwrap_or_else(|| "unspecified".to_string());
            return Err(AppError::internal(format!("ipapi error: {reason}")));
        }

        Ok(parsed.into())
    }
}
