//! In-memory job store for single-process deployments and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::{UrlSafety, ValidationJob};
use crate::domain::repositories::{JobStore, StatusUpdate};
use crate::error::AppError;

/// Job store backed by a process-local map.
#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<Uuid, ValidationJob>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn put(&self, job: ValidationJob) -> Result<(), AppError> {
        self.jobs.write().await.insert(job.id, job);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<ValidationJob>, AppError> {
        Ok(self.jobs.read().await.get(&id).cloned())
    }

    async fn compare_and_set_status(
        &self,
        id: Uuid,
        status: UrlSafety,
    ) -> Result<Option<StatusUpdate>, AppError> {
        let mut jobs = self.jobs.write().await;
        let Some(job) = jobs.get_mut(&id) else {
            return Ok(None);
        };

        let update = if job.apply_status(status) {
            StatusUpdate::Applied(job.clone())
        } else {
            StatusUpdate::Ignored(job.clone())
        };
        Ok(Some(update))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::CanonicalUrl;

    fn job() -> ValidationJob {
        ValidationJob::new(
            Uuid::new_v4(),
            CanonicalUrl::parse("http://example.com").unwrap(),
        )
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let store = InMemoryJobStore::new();
        let job = job();
        store.put(job.clone()).await.unwrap();

        let found = store.get(job.id).await.unwrap().unwrap();
        assert_eq!(found, job);
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let store = InMemoryJobStore::new();
        assert!(store.get(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cas_applies_first_terminal() {
        let store = InMemoryJobStore::new();
        let job = job();
        store.put(job.clone()).await.unwrap();

        let update = store
            .compare_and_set_status(job.id, UrlSafety::Safe)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(update, StatusUpdate::Applied(_)));
        assert_eq!(update.job().status, UrlSafety::Safe);
    }

    #[tokio::test]
    async fn test_cas_ignores_second_terminal() {
        let store = InMemoryJobStore::new();
        let job = job();
        store.put(job.clone()).await.unwrap();

        store
            .compare_and_set_status(job.id, UrlSafety::Unreachable)
            .await
            .unwrap();
        let update = store
            .compare_and_set_status(job.id, UrlSafety::Safe)
            .await
            .unwrap()
            .unwrap();

        assert!(matches!(update, StatusUpdate::Ignored(_)));
        assert_eq!(update.job().status, UrlSafety::Unreachable);
    }

    #[tokio::test]
    async fn test_cas_missing_job() {
        let store = InMemoryJobStore::new();
        let result = store
            .compare_and_set_status(Uuid::new_v4(), UrlSafety::Safe)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_cas_is_idempotent_for_terminal_status() {
        let store = InMemoryJobStore::new();
        let job = job();
        store.put(job.clone()).await.unwrap();

        let first = store
            .compare_and_set_status(job.id, UrlSafety::Safe)
            .await
            .unwrap()
            .unwrap();
        let second = store
            .compare_and_set_status(job.id, UrlSafety::Safe)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(first.job().status, second.job().status);
        assert!(matches!(second, StatusUpdate::Ignored(_)));
    }
}
