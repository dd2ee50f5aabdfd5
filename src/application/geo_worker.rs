//! Background worker pool for processing click events asynchronously.
//!
//! The redirect path publishes [`ClickEvent`]s to a bounded channel and never
//! waits; this pool drains the channel and runs the geo processor with
//! bounded concurrency.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::application::services::geo_processor::GeoProcessor;
use crate::domain::entities::ClickEvent;

/// Runs the geo worker pool until the sending side of the channel closes.
///
/// At most `concurrency` events are in-flight simultaneously. When all slots
/// are busy, the pool waits for one to finish before accepting the next
/// event; the channel buffer absorbs bursts beyond this limit.
///
/// Events are processed at most once: a failed event is logged and discarded,
/// never retried, so the aggregate counters cannot be double-applied.
///
/// # Graceful Shutdown
///
/// The pool exits when every sender is dropped. Before returning, all
/// in-flight tasks are drained so no accepted event is lost.
///
/// # Metrics
///
/// - `geo_worker_received_total` - events received from the channel
/// - `geo_worker_processed_total` - events fully processed
/// - `geo_worker_failed_total` - events discarded after a processing failure
pub async fn run_geo_worker(
    mut rx: mpsc::Receiver<ClickEvent>,
    processor: Arc<GeoProcessor>,
    concurrency: usize,
) {
    let concurrency = concurrency.max(1);
    info!(concurrency, "Geo worker started");

    let mut join_set: JoinSet<()> = JoinSet::new();

    while let Some(event) = rx.recv().await {
        metrics::counter!("geo_worker_received_total").increment(1);

        // Clean up already-finished tasks to keep join_set size accurate.
        while join_set.try_join_next().is_some() {}

        // If at capacity, wait for one slot to free up before spawning more.
        if join_set.len() >= concurrency {
            join_set.join_next().await;
        }

        let processor = processor.clone();
        join_set.spawn(async move {
            let short_url_id = event.short_url_id.clone();
            match processor.process(event).await {
                Ok(()) => {
                    metrics::counter!("geo_worker_processed_total").increment(1);
                }
                Err(e) => {
                    metrics::counter!("geo_worker_failed_total").increment(1);
                    error!(
                        short_url_id = %short_url_id,
                        error = %e,
                        "Geo worker: failed to process click event"
                    );
                }
            }
        });
    }

    // Drain all in-flight tasks before returning so no events are lost on
    // shutdown.
    while join_set.join_next().await.is_some() {}

    info!("Geo worker stopped");
}
