//! Job orchestration: submission, polling, and status transitions.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::entities::{CanonicalUrl, UrlSafety, ValidationJob, ValidationMessage};
use crate::domain::repositories::{JobStore, StatusUpdate};
use crate::error::AppError;
use crate::infrastructure::queue::QueuePublisher;

/// Entry point of the validation pipeline.
///
/// The front controller talks to the core exclusively through this service:
/// `enqueue` to submit a URL, `find` to poll, while the result sink drives
/// `update_status`. Nothing else mutates job state.
pub struct ValidationOrchestrator {
    store: Arc<dyn JobStore>,
    publisher: Arc<dyn QueuePublisher>,
    work_queue: String,
}

impl ValidationOrchestrator {
    pub fn new(
        store: Arc<dyn JobStore>,
        publisher: Arc<dyn QueuePublisher>,
        work_queue: impl Into<String>,
    ) -> Self {
        Self {
            store,
            publisher,
            work_queue: work_queue.into(),
        }
    }

    /// Accepts a raw URL for validation.
    ///
    /// Canonicalizes the URL, records a Pending job, and publishes the first
    /// (reachability) message. Succeeds only if both the store write and the
    /// publish succeed.
    ///
    /// # Errors
    ///
    /// - [`AppError::InvalidInput`] for empty/oversize/malformed input
    /// - [`AppError::InvalidUrl`] for non-http(s) schemes
    /// - [`AppError::Queue`] when the work message cannot be published
    /// - [`AppError::Internal`] when the job record cannot be written
    pub async fn enqueue(&self, raw_url: &str) -> Result<Uuid, AppError> {
        let url = CanonicalUrl::parse(raw_url)?;

        let message = ValidationMessage::new(url.clone());
        let job = ValidationJob::new(message.id, url);

        self.store.put(job).await?;

        let payload = serde_json::to_vec(&message)?;
        self.publisher.publish(&self.work_queue, payload).await?;

        info!(job_id = %message.id, url = %message.url, "Validation job enqueued");
        Ok(message.id)
    }

    /// Current job state, if the id was ever enqueued.
    pub async fn find(&self, job_id: Uuid) -> Result<Option<ValidationJob>, AppError> {
        self.store.get(job_id).await
    }

    /// Idempotent status mutator, invoked solely by the result sink.
    ///
    /// Re-applying a transition, or applying any transition to a job already
    /// terminal, reports [`StatusUpdate::Ignored`] without changing state.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] when no job with this id exists.
    pub async fn update_status(
        &self,
        job_id: Uuid,
        status: UrlSafety,
    ) -> Result<StatusUpdate, AppError> {
        let update = self
            .store
            .compare_and_set_status(job_id, status)
            .await?
            .ok_or_else(|| AppError::not_found(format!("validation job {job_id}")))?;

        match &update {
            StatusUpdate::Applied(job) => {
                info!(job_id = %job.id, status = %job.status, "Job status updated");
            }
            StatusUpdate::Ignored(job) => {
                debug!(
                    job_id = %job.id,
                    current = %job.status,
                    requested = %status,
                    "Job status transition ignored"
                );
            }
        }
        Ok(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ValidationStep;
    use crate::domain::repositories::MockJobStore;
    use crate::infrastructure::queue::{MockQueuePublisher, QueueError};

    fn make_orchestrator(
        store: MockJobStore,
        publisher: MockQueuePublisher,
    ) -> ValidationOrchestrator {
        ValidationOrchestrator::new(Arc::new(store), Arc::new(publisher), "work")
    }

    #[tokio::test]
    async fn test_enqueue_stores_job_and_publishes_canonical_message() {
        let mut store = MockJobStore::new();
        store
            .expect_put()
            .withf(|job| {
                job.status == UrlSafety::Pending && job.url.as_str() == "http://example.com/"
            })
            .times(1)
            .returning(|_| Ok(()));

        let mut publisher = MockQueuePublisher::new();
        publisher
            .expect_publish()
            .withf(|queue, payload| {
                let msg: ValidationMessage = serde_json::from_slice(payload).unwrap();
                queue == "work"
                    && msg.url.as_str() == "http://example.com/"
                    && msg.step == ValidationStep::Reachability
                    && msg.retries == 0
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let orchestrator = make_orchestrator(store, publisher);
        let job_id = orchestrator.enqueue("HTTP://EXAMPLE.COM").await.unwrap();
        assert!(!job_id.is_nil());
    }

    #[tokio::test]
    async fn test_enqueue_rejects_unsupported_scheme_synchronously() {
        let mut store = MockJobStore::new();
        store.expect_put().times(0);
        let mut publisher = MockQueuePublisher::new();
        publisher.expect_publish().times(0);

        let orchestrator = make_orchestrator(store, publisher);
        let result = orchestrator.enqueue("ftp://example.com/").await;
        assert!(matches!(result, Err(AppError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_enqueue_rejects_malformed_input() {
        let orchestrator =
            make_orchestrator(MockJobStore::new(), MockQueuePublisher::new());
        let result = orchestrator.enqueue("not a url").await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_enqueue_surfaces_publish_failure() {
        let mut store = MockJobStore::new();
        store.expect_put().times(1).returning(|_| Ok(()));

        let mut publisher = MockQueuePublisher::new();
        publisher.expect_publish().times(1).returning(|queue, _| {
            Err(QueueError::Publish {
                queue: queue.to_string(),
                reason: "broker down".to_string(),
            })
        });

        let orchestrator = make_orchestrator(store, publisher);
        let result = orchestrator.enqueue("http://example.com").await;
        assert!(matches!(result, Err(AppError::Queue(_))));
    }

    #[tokio::test]
    async fn test_find_passes_through() {
        let job = ValidationJob::new(
            Uuid::new_v4(),
            CanonicalUrl::parse("http://example.com").unwrap(),
        );
        let id = job.id;

        let mut store = MockJobStore::new();
        let returned = job.clone();
        store
            .expect_get()
            .withf(move |got| *got == id)
            .times(1)
            .returning(move |_| Ok(Some(returned.clone())));

        let orchestrator = make_orchestrator(store, MockQueuePublisher::new());
        let found = orchestrator.find(id).await.unwrap().unwrap();
        assert_eq!(found, job);
    }

    #[tokio::test]
    async fn test_update_status_missing_job_is_not_found() {
        let mut store = MockJobStore::new();
        store
            .expect_compare_and_set_status()
            .times(1)
            .returning(|_, _| Ok(None));

        let orchestrator = make_orchestrator(store, MockQueuePublisher::new());
        let result = orchestrator
            .update_status(Uuid::new_v4(), UrlSafety::Safe)
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_status_reports_ignored_transition() {
        let mut job = ValidationJob::new(
            Uuid::new_v4(),
            CanonicalUrl::parse("http://example.com").unwrap(),
        );
        job.apply_status(UrlSafety::Unreachable);
        let id = job.id;

        let mut store = MockJobStore::new();
        let stored = job.clone();
        store
            .expect_compare_and_set_status()
            .times(1)
            .returning(move |_, _| Ok(Some(StatusUpdate::Ignored(stored.clone()))));

        let orchestrator = make_orchestrator(store, MockQueuePublisher::new());
        let update = orchestrator.update_status(id, UrlSafety::Safe).await.unwrap();
        assert!(matches!(update, StatusUpdate::Ignored(_)));
        assert_eq!(update.job().status, UrlSafety::Unreachable);
    }
}
