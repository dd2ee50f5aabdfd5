//! Result sink: the single consumer of the result queue.
//!
//! All job-store writes funnel through here, decoupling worker scale-out
//! from store connection count. The sink never raises: malformed payloads
//! and unknown job ids are logged and dropped so the queue cannot be
//! poisoned.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::application::services::orchestrator::ValidationOrchestrator;
use crate::domain::entities::ValidationResult;
use crate::domain::repositories::StatusUpdate;
use crate::error::AppError;
use crate::infrastructure::queue::{QueueConsumer, QueueError};

pub struct ResultSink {
    orchestrator: Arc<ValidationOrchestrator>,
}

impl ResultSink {
    pub fn new(orchestrator: Arc<ValidationOrchestrator>) -> Self {
        Self { orchestrator }
    }

    /// Consumes verdicts until the queue closes.
    ///
    /// Each message is acknowledged after [`apply`] returns: a successful
    /// store write, an ignored transition, and a dropped malformed payload
    /// all count as handled. Only a store failure (logged inside `apply`,
    /// which then reports unhandled) leaves the verdict for redelivery.
    ///
    /// [`apply`]: ResultSink::apply
    pub async fn run(self: Arc<Self>, consumer: Box<dyn QueueConsumer>) {
        info!("Result sink started");

        loop {
            match consumer.recv().await {
                Ok(bytes) => {
                    if self.apply(&bytes).await {
                        if let Err(e) = consumer.ack().await {
                            warn!(error = %e, "Result sink: ack failed, verdict may redeliver");
                        }
                    }
                }
                Err(QueueError::Closed) => break,
                Err(e) => {
                    error!(error = %e, "Result sink: receive failed");
                    tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                }
            }
        }

        info!("Result sink stopped");
    }

    /// Applies one raw result payload to the job store.
    ///
    /// Safe to call with the same payload any number of times: the store's
    /// terminal-absorbing transition makes re-application a no-op.
    ///
    /// Returns `true` when the message is finished (applied, ignored,
    /// unknown job, or unparseable) and may be acknowledged; `false` when
    /// the store write failed and the verdict should be redelivered.
    pub async fn apply(&self, payload: &[u8]) -> bool {
        let result: ValidationResult = match serde_json::from_slice(payload) {
            Ok(result) => result,
            Err(e) => {
                metrics::counter!("result_sink_rejected_total").increment(1);
                warn!(error = %e, "Result sink: dropping malformed result");
                return true;
            }
        };

        match self
            .orchestrator
            .update_status(result.job_id, result.status)
            .await
        {
            Ok(StatusUpdate::Applied(_)) => {
                metrics::counter!("result_sink_applied_total").increment(1);
                true
            }
            Ok(StatusUpdate::Ignored(job)) => {
                metrics::counter!("result_sink_rejected_total").increment(1);
                warn!(
                    job_id = %job.id,
                    current = %job.status,
                    requested = %result.status,
                    "Result sink: transition ignored (job already terminal)"
                );
                true
            }
            Err(AppError::NotFound(_)) => {
                metrics::counter!("result_sink_rejected_total").increment(1);
                warn!(job_id = %result.job_id, "Result sink: result for unknown job");
                true
            }
            Err(e) => {
                error!(job_id = %result.job_id, error = %e, "Result sink: store update failed");
                false
            }
        }
    }
}
