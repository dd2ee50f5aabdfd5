//! Repository trait for enriched click records.

use async_trait::async_trait;

use crate::domain::entities::ClickInfo;
use crate::error::AppError;

/// Append-only storage for per-click records.
///
/// Records are compact (no full request logs) and written once per processed
/// click by the geo worker pool.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgClickRepository`] - PostgreSQL
/// - [`crate::infrastructure::persistence::InMemoryClickRepository`] - tests
///   and single-process runs
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClickRepository: Send + Sync {
    /// Appends one enriched click record.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage failure. The caller logs and
    /// drops the event; there is no retry (a retry could double-apply the
    /// aggregate increments that follow).
    async fn record(&self, click: ClickInfo) -> Result<(), AppError>;
}
