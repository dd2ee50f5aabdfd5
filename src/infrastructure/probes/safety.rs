//! Threat-list safety prober.
//!
//! Single POST against the configured threat-matching endpoint. A URL is safe
//! iff the response reports no matches. Transport failures and non-2xx
//! answers are errors, not verdicts: the worker decides what an undetermined
//! check means.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::application::retry::RetryPolicy;
use crate::domain::entities::CanonicalUrl;
use crate::error::AppError;

const CLIENT_ID: &str = "url-shortener";
const CLIENT_VERSION: &str = "1.0";

const THREAT_TYPES: [&str; 4] = [
    "MALWARE",
    "SOCIAL_ENGINEERING",
    "UNWANTED_SOFTWARE",
    "POTENTIALLY_HARMFUL_APPLICATION",
];
const PLATFORM_TYPES: [&str; 1] = ["ANY_PLATFORM"];
const THREAT_ENTRY_TYPES: [&str; 1] = ["URL"];

#[derive(Debug, Deserialize)]
struct ThreatMatchResponse {
    #[serde(default)]
    matches: Vec<serde_json::Value>,
}

/// Checks whether a URL appears on the external threat lists.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SafetyProbe: Send + Sync {
    /// Returns `Ok(true)` when the service reports no matches, `Ok(false)`
    /// when at least one match exists.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::SafeBrowsing`] when no verdict could be obtained
    /// (transport failure after retries, or a non-2xx response).
    async fn check(&self, url: &CanonicalUrl) -> Result<bool, AppError>;
}

/// Production prober against a Safe-Browsing-style `threatMatches:find` API.
pub struct SafeBrowsingProbe {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    retry: RetryPolicy,
}

impl SafeBrowsingProbe {
    /// Builds the prober. The API key travels as a query-string parameter.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the HTTP client cannot be built.
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.into(),
            retry,
        })
    }

    fn request_body(url: &CanonicalUrl) -> serde_json::Value {
        json!({
            "client": {
                "clientId": CLIENT_ID,
                "clientVersion": CLIENT_VERSION,
            },
            "threatInfo": {
                "threatTypes": THREAT_TYPES,
                "platformTypes": PLATFORM_TYPES,
                "threatEntryTypes": THREAT_ENTRY_TYPES,
                "threatEntries": [{ "url": url.as_str() }],
            },
        })
    }

    async fn send(&self, body: &serde_json::Value) -> Result<reqwest::Response, reqwest::Error> {
        self.retry
            .run(
                || {
                    self.client
                        .post(&self.api_url)
                        .query(&[("key", self.api_key.as_str())])
                        .json(body)
                        .send()
                },
                |e: &reqwest::Error| e.is_timeout() || e.is_connect() || e.is_request(),
            )
            .await
    }
}

#[async_trait]
impl SafetyProbe for SafeBrowsingProbe {
    async fn check(&self, url: &CanonicalUrl) -> Result<bool, AppError> {
        let body = Self::request_body(url);

        let response = self
            .send(&body)
            .await
            .map_err(|e| AppError::SafeBrowsing(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::SafeBrowsing(format!(
                "threat-list service returned {status}"
            )));
        }

        let parsed: ThreatMatchResponse = response
            .json()
            .await
            .map_err(|e| AppError::SafeBrowsing(format!("unparseable response: {e}")))?;

        let safe = parsed.matches.is_empty();
        debug!(url = %url, safe, "Safety verdict");
        Ok(safe)
    }
}
