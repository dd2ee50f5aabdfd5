//! IP geolocation providers.
//!
//! Two HTTP providers with different wire formats map into one
//! [`GeoDetails`] target: [`IpapiProvider`] (primary, optional bearer auth)
//! and [`IpApiComProvider`] (fallback, unauthenticated). The processor in
//! [`crate::application::services::geo_processor`] owns the failover order.
//!
//! [`GeoDetails`]: crate::domain::entities::GeoDetails

mod fallback;
mod primary;

use async_trait::async_trait;

use crate::domain::entities::GeoDetails;
use crate::error::AppError;

pub use fallback::IpApiComProvider;
pub use primary::IpapiProvider;

/// Resolves one IP address to geographic details.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GeoProvider: Send + Sync {
    /// Short provider name for logs and metrics.
    fn name(&self) -> &'static str;

    /// Looks up `ip`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] when the provider is unreachable,
    /// answers with an error payload, or the response cannot be parsed.
    async fn lookup(&self, ip: &str) -> Result<GeoDetails, AppError>;
}

/// Expands the `{ip}` placeholder in a configured path template.
pub(crate) fn expand_path(base_url: &str, path: &str, ip: &str) -> String {
    format!(
        "{}{}",
        base_url.trim_end_matches('/'),
        path.replace("{ip}", ip)
    )
}
