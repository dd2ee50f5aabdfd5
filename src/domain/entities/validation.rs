//! Validation pipeline data model: steps, verdicts, messages, and jobs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::url::CanonicalUrl;

/// Which sub-check a work-queue message represents.
///
/// Every submission starts at `Reachability`; the worker flips the step to
/// `Safety` once the target responds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationStep {
    Reachability,
    Safety,
}

/// Verdict state of a validation job.
///
/// Encoded on the result queue as a tagged object (`{"type":"Safe"}`) so
/// consumers discriminate on the `type` field rather than on payload shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum UrlSafety {
    Pending,
    Safe,
    Unsafe,
    Unreachable,
    Unknown,
    Error,
}

impl UrlSafety {
    /// Terminal states are absorbing: once reached, a job never changes again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            UrlSafety::Safe | UrlSafety::Unsafe | UrlSafety::Unreachable | UrlSafety::Error
        )
    }
}

impl std::fmt::Display for UrlSafety {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            UrlSafety::Pending => "Pending",
            UrlSafety::Safe => "Safe",
            UrlSafety::Unsafe => "Unsafe",
            UrlSafety::Unreachable => "Unreachable",
            UrlSafety::Unknown => "Unknown",
            UrlSafety::Error => "Error",
        };
        f.write_str(name)
    }
}

/// Work-queue payload. The `id` is stable across retries and step flips, so
/// it doubles as the job identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationMessage {
    pub id: Uuid,
    pub url: CanonicalUrl,
    pub created_at: DateTime<Utc>,
    pub retries: u32,
    pub step: ValidationStep,
}

impl ValidationMessage {
    /// Creates a fresh message for a newly submitted URL.
    pub fn new(url: CanonicalUrl) -> Self {
        Self {
            id: Uuid::new_v4(),
            url,
            created_at: Utc::now(),
            retries: 0,
            step: ValidationStep::Reachability,
        }
    }

    /// Returns a copy of this message advanced to the given step.
    /// All other fields, including `id`, are preserved.
    pub fn with_step(&self, step: ValidationStep) -> Self {
        Self {
            step,
            ..self.clone()
        }
    }
}

/// Result-queue payload carrying a terminal verdict for one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub job_id: Uuid,
    pub status: UrlSafety,
}

/// Authoritative per-id validation state kept in the job store.
///
/// Status changes go through [`ValidationJob::apply_status`] only, which
/// enforces the terminal-absorbing rule for every store implementation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationJob {
    pub id: Uuid,
    pub url: CanonicalUrl,
    pub status: UrlSafety,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub retries: u32,
}

impl ValidationJob {
    /// Creates a pending job for a submitted URL.
    pub fn new(id: Uuid, url: CanonicalUrl) -> Self {
        Self {
            id,
            url,
            status: UrlSafety::Pending,
            created_at: Utc::now(),
            updated_at: None,
            retries: 0,
        }
    }

    /// Applies a status transition, returning `true` if the job changed.
    ///
    /// A job already in a terminal state ignores every further transition
    /// (first terminal wins). Re-applying the current status is a no-op that
    /// reports `false`.
    pub fn apply_status(&mut self, status: UrlSafety) -> bool {
        if self.status.is_terminal() || self.status == status {
            return false;
        }
        self.status = status;
        self.updated_at = Some(Utc::now());
        true
    }
}
