//! Canonical URL representation and hashing.
//!
//! Every URL entering the system passes through [`CanonicalUrl::parse`], so
//! the broker payloads, cache keys, and short-url hashes all agree on a
//! single normalized form.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::AppError;

/// Maximum accepted length for a submitted URL, in characters.
pub const MAX_URL_LEN: usize = 2048;

/// Errors that can occur while canonicalizing a URL.
#[derive(Debug, thiserror::Error)]
pub enum UrlError {
    #[error("URL must not be empty")]
    Empty,

    #[error("URL exceeds {MAX_URL_LEN} characters")]
    TooLong,

    #[error("invalid URL format: {0}")]
    Malformed(String),

    #[error("only HTTP and HTTPS URLs are supported")]
    UnsupportedScheme,
}

impl From<UrlError> for AppError {
    fn from(e: UrlError) -> Self {
        match e {
            UrlError::UnsupportedScheme => AppError::InvalidUrl(e.to_string()),
            other => AppError::InvalidInput(other.to_string()),
        }
    }
}

/// A URL in canonical form.
///
/// Canonicalization rules:
///
/// 1. Scheme must be `http` or `https`, lower-cased
/// 2. Host lower-cased and IDNA-encoded to ASCII
/// 3. Default ports removed (80 for HTTP, 443 for HTTPS)
/// 4. Empty path replaced with `/`
/// 5. Fragment stripped; query preserved as-is
///
/// Construction through [`CanonicalUrl::parse`] is the only way to obtain a
/// value, so holding a `CanonicalUrl` is proof the rules were applied.
/// Canonicalization is idempotent: re-parsing a canonical form yields the
/// same string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CanonicalUrl(String);

impl CanonicalUrl {
    /// Parses and canonicalizes a raw URL string.
    ///
    /// # Errors
    ///
    /// Returns [`UrlError::Empty`] / [`UrlError::TooLong`] for out-of-bounds
    /// input, [`UrlError::Malformed`] when parsing fails, and
    /// [`UrlError::UnsupportedScheme`] for anything but http(s).
    pub fn parse(input: &str) -> Result<Self, UrlError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(UrlError::Empty);
        }
        if trimmed.len() > MAX_URL_LEN {
            return Err(UrlError::TooLong);
        }

        let mut url = Url::parse(trimmed).map_err(|e| UrlError::Malformed(e.to_string()))?;

        match url.scheme() {
            "http" | "https" => {}
            _ => return Err(UrlError::UnsupportedScheme),
        }

        // The url crate already lower-cases the scheme and host and applies
        // IDNA encoding during parsing; what remains is port and fragment
        // normalization.
        url.set_fragment(None);

        let is_default_port = matches!(
            (url.scheme(), url.port()),
            ("http", Some(80)) | ("https", Some(443))
        );
        if is_default_port {
            url.set_port(None)
                .map_err(|_| UrlError::Malformed("failed to remove default port".to_string()))?;
        }

        Ok(Self(url.to_string()))
    }

    /// Deterministic short hash of the canonical form: CRC-32, lower-case hex.
    pub fn hash(&self) -> UrlHash {
        UrlHash(format!("{:08x}", crc32fast::hash(self.0.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CanonicalUrl {
    type Error = UrlError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CanonicalUrl> for String {
    fn from(url: CanonicalUrl) -> Self {
        url.0
    }
}

/// Short identifier derived from a canonical URL (8 hex characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UrlHash(String);

impl UrlHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UrlHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
