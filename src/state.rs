//! Application state shared with the HTTP front controller.
//!
//! The front controller interacts with the core solely through this type:
//! URL submission and polling via the orchestrator, click emission via the
//! bounded geo channel. Cloned freely; all members are cheap handles.

use std::sync::Arc;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::application::rate_limiter::TokenBucket;
use crate::application::services::ValidationOrchestrator;
use crate::domain::entities::{ClickEvent, ValidationJob};
use crate::error::AppError;
use crate::infrastructure::cache::KeyValueCache;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ValidationOrchestrator>,
    pub cache: Arc<dyn KeyValueCache>,
    pub safety_limiter: Arc<TokenBucket>,

    click_sender: mpsc::Sender<ClickEvent>,
}

impl AppState {
    pub fn new(
        orchestrator: Arc<ValidationOrchestrator>,
        cache: Arc<dyn KeyValueCache>,
        safety_limiter: Arc<TokenBucket>,
        click_sender: mpsc::Sender<ClickEvent>,
    ) -> Self {
        Self {
            orchestrator,
            cache,
            safety_limiter,
            click_sender,
        }
    }

    /// Submits a URL for validation. See
    /// [`ValidationOrchestrator::enqueue`].
    pub async fn submit_url(&self, raw_url: &str) -> Result<Uuid, AppError> {
        self.orchestrator.enqueue(raw_url).await
    }

    /// Polls a validation job.
    pub async fn find_job(&self, job_id: Uuid) -> Result<Option<ValidationJob>, AppError> {
        self.orchestrator.find(job_id).await
    }

    /// Hands a click event to the geo worker pool without waiting.
    ///
    /// When the channel is full the event is dropped: the redirect path must
    /// never block on analytics.
    pub fn emit_click(&self, event: ClickEvent) {
        if self.click_sender.try_send(event).is_err() {
            metrics::counter!("geo_events_dropped_total").increment(1);
            tracing::warn!("Geo event queue full, dropping click event");
        }
    }
}
