//! Job store trait for authoritative validation state.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::{UrlSafety, ValidationJob};
use crate::error::AppError;

/// Outcome of a compare-and-set status transition.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusUpdate {
    /// The transition was applied; carries the updated job.
    Applied(ValidationJob),
    /// The job was already terminal (or already in the requested state);
    /// carries the unchanged job.
    Ignored(ValidationJob),
}

impl StatusUpdate {
    pub fn job(&self) -> &ValidationJob {
        match self {
            StatusUpdate::Applied(job) | StatusUpdate::Ignored(job) => job,
        }
    }
}

/// Storage for [`ValidationJob`] records.
///
/// A job exists iff its id was ever enqueued by the orchestrator. Status
/// transitions go exclusively through [`JobStore::compare_and_set_status`],
/// which must enforce terminal-absorbing semantics (first terminal verdict
/// wins; later transitions are ignored, not errors).
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::InMemoryJobStore`] - single-process map
/// - [`crate::infrastructure::persistence::RedisJobStore`] - shared KV for
///   multi-process deployments
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Inserts a new job record.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] when the backing store is unavailable;
    /// the orchestrator treats this as a failed enqueue.
    async fn put(&self, job: ValidationJob) -> Result<(), AppError>;

    /// Fetches the current job state, if the id was ever enqueued.
    async fn get(&self, id: Uuid) -> Result<Option<ValidationJob>, AppError>;

    /// Attempts a status transition, enforcing the terminal-absorbing rule.
    ///
    /// Returns `None` when no job with this id exists.
    async fn compare_and_set_status(
        &self,
        id: Uuid,
        status: UrlSafety,
    ) -> Result<Option<StatusUpdate>, AppError>;
}
