//! Worker runtime: wiring and lifecycle.
//!
//! Connects the stores, cache, and broker, spawns the validation workers,
//! result sink, and geo pool, then waits for a shutdown signal. Redis and
//! Kafka are optional: without them the process falls back to in-memory
//! stores and loopback queues (single-process mode).

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::application::geo_worker::run_geo_worker;
use crate::application::rate_limiter::TokenBucket;
use crate::application::retry::RetryPolicy;
use crate::application::services::{
    GeoProcessor, ResultSink, ValidationOrchestrator, ValidationWorker,
};
use crate::config::Config;
use crate::domain::repositories::{AggregateStore, ClickRepository, JobStore};
use crate::infrastructure::cache::{KeyValueCache, NullCache, RedisCache};
use crate::infrastructure::persistence::{
    InMemoryAggregateStore, InMemoryJobStore, PgClickRepository, RedisAggregateStore,
    RedisJobStore,
};
use crate::infrastructure::probes::{
    HttpReachabilityProbe, IpApiComProvider, IpapiProvider, ReachabilityProbe, SafeBrowsingProbe,
    SafetyProbe,
};
use crate::infrastructure::queue::{
    KafkaPublisher, KafkaQueueConsumer, MemoryQueue, QueueConsumer, QueuePublisher,
};
use crate::state::AppState;

const VALIDATION_CONSUMER_GROUP: &str = "shortguard-validation";
const RESULT_CONSUMER_GROUP: &str = "shortguard-results";
const SAFEBROWSING_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs the pipeline with the given configuration until SIGTERM / Ctrl-C.
///
/// # Shutdown
///
/// On signal, the app state (and with it the geo channel sender) is dropped
/// so the geo pool drains its remaining events; validation workers and the
/// result sink are then aborted mid-receive. In-flight validation jobs are
/// re-delivered by the broker on the next start.
///
/// # Errors
///
/// Returns an error if the database connection, migration, broker setup, or
/// probe construction fails.
pub async fn run(config: Config) -> Result<()> {
    config.print_summary();

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to migrate")?;

    let cache: Arc<dyn KeyValueCache> = match &config.redis_url {
        Some(redis_url) => match RedisCache::connect(redis_url).await {
            Ok(redis) => {
                tracing::info!("Cache enabled (Redis)");
                Arc::new(redis)
            }
            Err(e) => {
                tracing::warn!("Failed to connect to Redis: {}. Using NullCache.", e);
                Arc::new(NullCache::new())
            }
        },
        None => {
            tracing::info!("Cache disabled (NullCache)");
            Arc::new(NullCache::new())
        }
    };

    let job_store: Arc<dyn JobStore> = match &config.redis_url {
        Some(redis_url) => Arc::new(RedisJobStore::connect(redis_url).await?),
        None => Arc::new(InMemoryJobStore::new()),
    };

    let aggregates: Arc<dyn AggregateStore> = match &config.redis_url {
        Some(redis_url) => Arc::new(RedisAggregateStore::connect(redis_url).await?),
        None => Arc::new(InMemoryAggregateStore::new()),
    };

    let clicks: Arc<dyn ClickRepository> = Arc::new(PgClickRepository::new(Arc::new(pool)));

    // Broker: Kafka when configured, loopback queues otherwise.
    let work_queue = config.safebrowsing.work_queue.as_str();
    let result_queue = config.safebrowsing.result_queue.as_str();

    let publisher: Arc<dyn QueuePublisher>;
    let mut work_consumers: Vec<Box<dyn QueueConsumer>> = Vec::new();
    let result_consumer: Box<dyn QueueConsumer>;

    match &config.kafka_bootstrap_servers {
        Some(servers) => {
            publisher = Arc::new(KafkaPublisher::connect(servers)?);
            for _ in 0..config.validation_workers {
                work_consumers.push(Box::new(KafkaQueueConsumer::connect(
                    servers,
                    VALIDATION_CONSUMER_GROUP,
                    work_queue,
                )?));
            }
            result_consumer = Box::new(KafkaQueueConsumer::connect(
                servers,
                RESULT_CONSUMER_GROUP,
                result_queue,
            )?);
            tracing::info!("Broker enabled (Kafka)");
        }
        None => {
            let broker = MemoryQueue::new();
            for _ in 0..config.validation_workers {
                work_consumers.push(Box::new(broker.consumer(work_queue)));
            }
            result_consumer = Box::new(broker.consumer(result_queue));
            publisher = Arc::new(broker);
            tracing::info!("Broker disabled (loopback queues)");
        }
    }

    // Probes and policies.
    let retry = RetryPolicy::from_config(config.retry.max_attempts, &config.retry.wait_duration)?;

    let reachability: Arc<dyn ReachabilityProbe> = Arc::new(HttpReachabilityProbe::new(
        cache.clone(),
        retry.clone(),
        config.reachability.timeout(),
        config.reachability.cache_enabled,
        config.reachability.cache_ttl(),
    )?);

    let safety: Arc<dyn SafetyProbe> = Arc::new(SafeBrowsingProbe::new(
        &config.safebrowsing.api_url,
        &config.safebrowsing.api_key,
        SAFEBROWSING_TIMEOUT,
        retry,
    )?);

    let limiter = Arc::new(TokenBucket::new(
        config.safebrowsing.ratelimit.capacity,
        config.safebrowsing.ratelimit.refill_tokens,
        config.safebrowsing.ratelimit.refill_period(),
    ));

    let orchestrator = Arc::new(ValidationOrchestrator::new(
        job_store,
        publisher.clone(),
        work_queue,
    ));

    // Validation workers, one consumer each.
    let worker = Arc::new(ValidationWorker::new(
        reachability,
        safety,
        limiter.clone(),
        publisher,
        work_queue,
        result_queue,
    ));

    let mut pipeline_tasks = JoinSet::new();
    for consumer in work_consumers {
        let worker = worker.clone();
        pipeline_tasks.spawn(worker.run(consumer));
    }

    let sink = Arc::new(ResultSink::new(orchestrator.clone()));
    pipeline_tasks.spawn(sink.run(result_consumer));
    tracing::info!(workers = config.validation_workers, "Validation pipeline started");

    // Geo pool.
    let geo_processor = Arc::new(GeoProcessor::new(
        cache.clone(),
        Arc::new(IpapiProvider::new(
            &config.geo.provider_base_url,
            &config.geo.provider_path,
            config.geo.provider_api_key.clone(),
            config.geo.provider_timeout(),
        )?),
        Arc::new(IpApiComProvider::new(
            &config.geo.fallback_base_url,
            &config.geo.fallback_path,
            config.geo.provider_timeout(),
        )?),
        clicks,
        aggregates,
        config.geo.positive_ttl(),
        config.geo.negative_ttl(),
    ));

    let (click_tx, click_rx) = mpsc::channel(config.geo_queue_capacity);
    let geo_handle = tokio::spawn(run_geo_worker(
        click_rx,
        geo_processor,
        config.geo_worker_concurrency,
    ));

    let state = AppState::new(orchestrator, cache, limiter, click_tx);

    wait_for_shutdown().await;

    // Dropping the state closes the geo channel; the pool drains before
    // exiting. Validation consumers are aborted mid-receive.
    drop(state);
    tracing::info!("Draining geo event queue...");
    geo_handle.await.ok();

    pipeline_tasks.abort_all();
    while pipeline_tasks.join_next().await.is_some() {}
    tracing::info!("Shutdown complete");

    Ok(())
}

/// Blocks until the process is asked to stop: Ctrl-C anywhere, SIGTERM on
/// Unix. If the SIGTERM handler cannot be registered the runtime still
/// listens for Ctrl-C rather than refusing to start.
#[cfg(unix)]
async fn wait_for_shutdown() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("SIGTERM received, stopping"),
                _ = tokio::signal::ctrl_c() => tracing::info!("Ctrl-C received, stopping"),
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, listening for Ctrl-C only");
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Ctrl-C received, stopping");
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("Ctrl-C received, stopping");
    }
}
