//! HTTP reachability prober.
//!
//! Issues a HEAD probe (GET fallback for servers that reject HEAD) with a
//! short timeout and no redirect following, classifies the outcome into a
//! [`ReachabilityVerdict`], and caches every verdict, including negative
//! ones.

use std::error::Error as _;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use crate::application::retry::RetryPolicy;
use crate::domain::entities::CanonicalUrl;
use crate::error::AppError;
use crate::infrastructure::cache::{keys, KeyValueCache};

/// User-Agent sent on every probe request.
pub const PROBE_USER_AGENT: &str = "UrlShortener-Bot/1.0";

/// Why a probe concluded the target is unreachable.
///
/// Encoded on the wire as `TIMEOUT`, `DNS_ERROR`, `NETWORK_ERROR`, or
/// `HTTP_<code>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeErrorKind {
    Timeout,
    DnsError,
    NetworkError,
    Http(u16),
}

impl ProbeErrorKind {
    fn as_wire(&self) -> String {
        match self {
            Self::Timeout => "TIMEOUT".to_string(),
            Self::DnsError => "DNS_ERROR".to_string(),
            Self::NetworkError => "NETWORK_ERROR".to_string(),
            Self::Http(code) => format!("HTTP_{code}"),
        }
    }

    fn from_wire(s: &str) -> Option<Self> {
        match s {
            "TIMEOUT" => Some(Self::Timeout),
            "DNS_ERROR" => Some(Self::DnsError),
            "NETWORK_ERROR" => Some(Self::NetworkError),
            _ => s
                .strip_prefix("HTTP_")
                .and_then(|code| code.parse().ok())
                .map(Self::Http),
        }
    }
}

impl Serialize for ProbeErrorKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_wire())
    }
}

impl<'de> Deserialize<'de> for ProbeErrorKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::from_wire(&raw)
            .ok_or_else(|| D::Error::custom(format!("unknown probe error kind '{raw}'")))
    }
}

/// Outcome of probing one URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReachabilityVerdict {
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<ProbeErrorKind>,
}

impl ReachabilityVerdict {
    fn reachable(status: u16, content_type: Option<String>, elapsed_ms: u64) -> Self {
        Self {
            reachable: true,
            status_code: Some(status),
            response_time_ms: Some(elapsed_ms),
            content_type,
            error_type: None,
        }
    }

    fn unreachable(error_type: ProbeErrorKind, status: Option<u16>, elapsed_ms: u64) -> Self {
        Self {
            reachable: false,
            status_code: status,
            response_time_ms: Some(elapsed_ms),
            content_type: None,
            error_type: Some(error_type),
        }
    }
}

/// Determines whether a URL responds at all.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    /// Probes the URL, consulting and updating the verdict cache.
    ///
    /// Network failures are part of the verdict, not errors; `Err` means the
    /// probe itself faulted unexpectedly.
    async fn probe(&self, url: &CanonicalUrl) -> Result<ReachabilityVerdict, AppError>;
}

/// Production prober over a shared `reqwest` client.
pub struct HttpReachabilityProbe {
    client: reqwest::Client,
    cache: Arc<dyn KeyValueCache>,
    retry: RetryPolicy,
    cache_enabled: bool,
    cache_ttl: Duration,
}

impl HttpReachabilityProbe {
    /// Builds the prober.
    ///
    /// The client never follows redirects: a 3xx answer is itself the
    /// verdict.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the HTTP client cannot be built.
    pub fn new(
        cache: Arc<dyn KeyValueCache>,
        retry: RetryPolicy,
        timeout: Duration,
        cache_enabled: bool,
        cache_ttl: Duration,
    ) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .user_agent(PROBE_USER_AGENT)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| AppError::internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            cache,
            retry,
            cache_enabled,
            cache_ttl,
        })
    }

    async fn send(&self, method: Method, url: &str) -> Result<reqwest::Response, reqwest::Error> {
        self.retry
            .run(
                || self.client.request(method.clone(), url).send(),
                is_retryable,
            )
            .await
    }
}

/// Servers that reject the probe method get one GET retry.
fn wants_get_fallback(status: StatusCode) -> bool {
    status == StatusCode::METHOD_NOT_ALLOWED || status == StatusCode::NOT_IMPLEMENTED
}

fn is_retryable(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_request()
}

fn is_dns_error(e: &reqwest::Error) -> bool {
    let mut source = e.source();
    while let Some(inner) = source {
        let text = inner.to_string().to_ascii_lowercase();
        if text.contains("dns") || text.contains("failed to lookup") {
            return true;
        }
        source = inner.source();
    }
    false
}

fn classify_error(e: &reqwest::Error) -> ProbeErrorKind {
    if e.is_timeout() {
        ProbeErrorKind::Timeout
    } else if is_dns_error(e) {
        ProbeErrorKind::DnsError
    } else {
        ProbeErrorKind::NetworkError
    }
}

fn classify_response(status: StatusCode, content_type: Option<String>, elapsed_ms: u64) -> ReachabilityVerdict {
    let code = status.as_u16();
    match code {
        200..=299 => ReachabilityVerdict::reachable(code, content_type, elapsed_ms),
        300..=399 => ReachabilityVerdict::reachable(code, None, elapsed_ms),
        _ => ReachabilityVerdict::unreachable(ProbeErrorKind::Http(code), Some(code), elapsed_ms),
    }
}

#[async_trait]
impl ReachabilityProbe for HttpReachabilityProbe {
    async fn probe(&self, url: &CanonicalUrl) -> Result<ReachabilityVerdict, AppError> {
        let key = keys::reachability(url);

        if self.cache_enabled {
            if let Ok(Some(raw)) = self.cache.get(&key).await {
                match serde_json::from_str::<ReachabilityVerdict>(&raw) {
                    Ok(verdict) => {
                        debug!(url = %url, "Reachability verdict from cache");
                        return Ok(verdict);
                    }
                    Err(_) => {
                        let _ = self.cache.delete(&key).await;
                    }
                }
            }
        }

        let started = Instant::now();
        let outcome = match self.send(Method::HEAD, url.as_str()).await {
            Ok(resp) if wants_get_fallback(resp.status()) => {
                debug!(url = %url, status = %resp.status(), "HEAD rejected, retrying as GET");
                self.send(Method::GET, url.as_str()).await
            }
            other => other,
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let verdict = match outcome {
            Ok(resp) => {
                let content_type = resp
                    .headers()
                    .get(CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                classify_response(resp.status(), content_type, elapsed_ms)
            }
            Err(e) => {
                ReachabilityVerdict::unreachable(classify_error(&e), None, elapsed_ms)
            }
        };

        if self.cache_enabled {
            if let Ok(json) = serde_json::to_string(&verdict) {
                let _ = self.cache.put(&key, &json, self.cache_ttl).await;
            }
        }

        Ok(verdict)
    }
}
