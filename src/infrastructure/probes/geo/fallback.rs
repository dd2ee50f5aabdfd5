//! Fallback geolocation provider (`ip-api.com` wire format).

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{expand_path, GeoProvider};
use crate::domain::entities::GeoDetails;
use crate::error::AppError;

/// `ip-api.com`-style JSON payload. Failures are HTTP 200 with
/// `status != "success"`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IpApiComResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: Option<String>,
    country: Option<String>,
    country_code: Option<String>,
    region_name: Option<String>,
    city: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    timezone: Option<String>,
    isp: Option<String>,
    org: Option<String>,
}

impl From<IpApiComResponse> for GeoDetails {
    fn from(r: IpApiComResponse) -> Self {
        GeoDetails {
            country_code: r.country_code,
            country_name: r.country,
            region: r.region_name,
            city: r.city,
            latitude: r.lat,
            longitude: r.lon,
            timezone: r.timezone,
            isp: r.isp,
            organization: r.org,
        }
    }
}

pub struct IpApiComProvider {
    client: reqwest::Client,
    base_url: String,
    path: String,
}

impl IpApiComProvider {
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        path: impl Into<String>,
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
        })
    }
}

#[async_trait]
impl GeoProvider for IpApiComProvider {
    fn name(&self) -> &'static str {
        "ip-api"
    }

    async fn lookup(&self, ip: &str) -> Result<GeoDetails, AppError> {
        let url = expand_path(&self.base_url, &self.path, ip);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::internal(format!("ip-api request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::internal(format!("ip-api returned {status}")));
        }

        let parsed: IpApiComResponse = response
            .json()
            .await
            .map_err(|e| AppError::internal(format!("unparseable ip-api response: {e}")))?;

        if parsed.status != "success" {
            let message = parsed.message.unwrap_or_else(|| "unspecified".to_string());
            return Err(AppError::internal(format!("ip-api error: {message}")));
        }

        Ok(parsed.into())
    }
}
