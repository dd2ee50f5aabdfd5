//! Application error types.
//!
//! One variant per failure kind that callers can meaningfully react to.
//! Synchronous failures (`InvalidInput`, `InvalidUrl`, `Queue`) are surfaced
//! by the orchestrator; everything downstream of the work queue is visible
//! only through job polling.

use crate::infrastructure::queue::QueueError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed or oversize input rejected before any work is enqueued.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Syntactically valid URL with a scheme that cannot be shortened.
    #[error("unsupported URL: {0}")]
    InvalidUrl(String),

    /// A job id or short-url key that does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A message could not be published to the broker.
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// The threat-list service gave no usable verdict.
    #[error("safe browsing check failed: {0}")]
    SafeBrowsing(String),

    /// Uncaught fault; details are logged, not exposed.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        Self::Internal(format!("serialization error: {e}"))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        Self::Internal(format!("database error: {e}"))
    }
}

impl From<redis::RedisError> for AppError {
    fn from(e: redis::RedisError) -> Self {
        Self::Internal(format!("redis error: {e}"))
    }
}
