//! Redis-backed job store for multi-process deployments.
//!
//! Jobs are stored as JSON under `validation:job:<id>`. The status transition
//! is read-check-write rather than a WATCH transaction: the result sink is
//! the architecture's single writer, so no concurrent mutator exists.

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use uuid::Uuid;

use crate::domain::entities::{UrlSafety, ValidationJob};
use crate::domain::repositories::{JobStore, StatusUpdate};
use crate::error::AppError;

fn job_key(id: Uuid) -> String {
    format!("validation:job:{id}")
}

pub struct RedisJobStore {
    client: ConnectionManager,
}

impl RedisJobStore {
    /// Connects to Redis and validates the connection with a PING.
    pub async fn connect(redis_url: &str) -> Result<Self, AppError> {
        let client = Client::open(redis_url)
            .map_err(|e| AppError::internal(format!("invalid Redis URL: {e}")))?;
        let manager = ConnectionManager::new(client).await?;

        let mut test_conn = manager.clone();
        redis::cmd("PING").query_async::<()>(&mut test_conn).await?;

        Ok(Self { client: manager })
    }

    async fn write(&self, job: &ValidationJob) -> Result<(), AppError> {
        let mut conn = self.client.clone();
        let payload = serde_json::to_string(job)?;
        conn.set::<_, _, ()>(job_key(job.id), payload).await?;
        Ok(())
    }
}

#[async_trait]
impl JobStore for RedisJobStore {
    async fn put(&self, job: ValidationJob) -> Result<(), AppError> {
        self.write(&job).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<ValidationJob>, AppError> {
        let mut conn = self.client.clone();
        let raw: Option<String> = conn.get(job_key(id)).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn compare_and_set_status(
        &self,
        id: Uuid,
        status: UrlSafety,
    ) -> Result<Option<StatusUpdate>, AppError> {
        let Some(mut job) = self.get(id).await? else {
            return Ok(None);
        };

        if job.apply_status(status) {
            self.write(&job).await?;
            Ok(Some(StatusUpdate::Applied(job)))
        } else {
            Ok(Some(StatusUpdate::Ignored(job)))
        }
    }
}
