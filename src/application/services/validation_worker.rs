//! Validation worker: the consumer side of the work queue.
//!
//! Dispatches each message on its step. Reachability flips reachable
//! messages to the safety step; safety turns prober verdicts into terminal
//! results on the result queue. Rate-limiter refusals re-enqueue the
//! unchanged message after a short sleep, forming a cooperative backpressure
//! loop bounded by broker capacity.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::application::rate_limiter::TokenBucket;
use crate::domain::entities::{UrlSafety, ValidationMessage, ValidationResult, ValidationStep};
use crate::error::AppError;
use crate::infrastructure::probes::{ReachabilityProbe, SafetyProbe};
use crate::infrastructure::queue::{QueueConsumer, QueueError, QueuePublisher};

/// Pause before re-enqueueing a rate-limited safety message.
const DEFAULT_REQUEUE_DELAY: Duration = Duration::from_secs(1);

/// Pause after a transient broker receive error.
const RECEIVE_BACKOFF: Duration = Duration::from_secs(1);

pub struct ValidationWorker {
    reachability: Arc<dyn ReachabilityProbe>,
    safety: Arc<dyn SafetyProbe>,
    limiter: Arc<TokenBucket>,
    publisher: Arc<dyn QueuePublisher>,
    work_queue: String,
    result_queue: String,
    requeue_delay: Duration,
}

impl ValidationWorker {
    pub fn new(
        reachability: Arc<dyn ReachabilityProbe>,
        safety: Arc<dyn SafetyProbe>,
        limiter: Arc<TokenBucket>,
        publisher: Arc<dyn QueuePublisher>,
        work_queue: impl Into<String>,
        result_queue: impl Into<String>,
    ) -> Self {
        Self {
            reachability,
            safety,
            limiter,
            publisher,
            work_queue: work_queue.into(),
            result_queue: result_queue.into(),
            requeue_delay: DEFAULT_REQUEUE_DELAY,
        }
    }

    /// Overrides the rate-limit requeue pause. Tests shrink it.
    pub fn with_requeue_delay(mut self, delay: Duration) -> Self {
        self.requeue_delay = delay;
        self
    }

    /// Consumes messages until the queue closes.
    ///
    /// A message is acknowledged only after [`handle`] has finished its
    /// downstream publish, so a crash mid-message leads to redelivery, not
    /// loss. Malformed payloads are logged, acked, and dropped; handler
    /// errors leave the message unacked for the broker to redeliver.
    ///
    /// [`handle`]: ValidationWorker::handle
    pub async fn run(self: Arc<Self>, consumer: Box<dyn QueueConsumer>) {
        info!(queue = %self.work_queue, "Validation worker started");

        loop {
            match consumer.recv().await {
                Ok(bytes) => match serde_json::from_slice::<ValidationMessage>(&bytes) {
                    Ok(message) => match self.handle(message).await {
                        Ok(()) => {
                            metrics::counter!("validation_worker_processed_total").increment(1);
                            if let Err(e) = consumer.ack().await {
                                warn!(error = %e, "Validation worker: ack failed, message may redeliver");
                            }
                        }
                        Err(e) => {
                            metrics::counter!("validation_worker_failed_total").increment(1);
                            error!(error = %e, "Validation worker: message handling failed");
                        }
                    },
                    Err(e) => {
                        metrics::counter!("validation_worker_dropped_total").increment(1);
                        warn!(error = %e, "Validation worker: dropping malformed message");
                        // Acked so the junk payload does not loop forever.
                        if let Err(e) = consumer.ack().await {
                            warn!(error = %e, "Validation worker: ack failed for dropped message");
                        }
                    }
                },
                Err(QueueError::Closed) => break,
                Err(e) => {
                    error!(error = %e, "Validation worker: receive failed");
                    tokio::time::sleep(RECEIVE_BACKOFF).await;
                }
            }
        }

        info!(queue = %self.work_queue, "Validation worker stopped");
    }

    /// Processes one message according to its step.
    pub async fn handle(&self, message: ValidationMessage) -> Result<(), AppError> {
        match message.step {
            ValidationStep::Reachability => self.handle_reachability(message).await,
            ValidationStep::Safety => self.handle_safety(message).await,
        }
    }

    /// Reachability never emits Safe/Unsafe: a reachable target advances to
    /// the safety step, everything else terminates the job.
    async fn handle_reachability(&self, message: ValidationMessage) -> Result<(), AppError> {
        match self.reachability.probe(&message.url).await {
            Ok(verdict) if verdict.reachable => {
                debug!(
                    job_id = %message.id,
                    status = ?verdict.status_code,
                    "URL reachable, advancing to safety check"
                );
                self.republish(message.with_step(ValidationStep::Safety))
                    .await
            }
            Ok(verdict) => {
                info!(
                    job_id = %message.id,
                    url = %message.url,
                    error_type = ?verdict.error_type,
                    "URL unreachable"
                );
                self.publish_result(message.id, UrlSafety::Unreachable)
                    .await
            }
            Err(e) => {
                error!(job_id = %message.id, error = %e, "Reachability probe faulted");
                self.publish_result(message.id, UrlSafety::Error).await
            }
        }
    }

    async fn handle_safety(&self, message: ValidationMessage) -> Result<(), AppError> {
        if !self.limiter.try_consume() {
            metrics::counter!("validation_worker_requeued_total").increment(1);
            debug!(job_id = %message.id, "Safety rate limit reached, re-enqueueing");
            tokio::time::sleep(self.requeue_delay).await;
            return self.republish(message).await;
        }

        match self.safety.check(&message.url).await {
            Ok(true) => self.publish_result(message.id, UrlSafety::Safe).await,
            Ok(false) => {
                warn!(job_id = %message.id, url = %message.url, "URL flagged unsafe");
                self.publish_result(message.id, UrlSafety::Unsafe).await
            }
            Err(e) => {
                // Retries are exhausted at this point; the job stays Pending
                // for an operational sweep to pick up.
                metrics::counter!("validation_worker_dropped_total").increment(1);
                warn!(
                    job_id = %message.id,
                    error = %e,
                    "Safety check undetermined after retries, dropping message"
                );
                Ok(())
            }
        }
    }

    async fn republish(&self, message: ValidationMessage) -> Result<(), AppError> {
        let payload = serde_json::to_vec(&message)?;
        self.publisher.publish(&self.work_queue, payload).await?;
        Ok(())
    }

    async fn publish_result(&self, job_id: Uuid, status: UrlSafety) -> Result<(), AppError> {
        let result = ValidationResult { job_id, status };
        let payload = serde_json::to_vec(&result)?;
        self.publisher.publish(&self.result_queue, payload).await?;
        Ok(())
    }
}
