#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use uuid::Uuid;

use shortguard::application::rate_limiter::TokenBucket;
use shortguard::application::services::{ResultSink, ValidationOrchestrator, ValidationWorker};
use shortguard::domain::entities::{CanonicalUrl, GeoDetails, UrlSafety, ValidationJob};
use shortguard::error::AppError;
use shortguard::infrastructure::cache::{CacheResult, KeyValueCache};
use shortguard::infrastructure::persistence::InMemoryJobStore;
use shortguard::infrastructure::probes::{
    GeoProvider, ProbeErrorKind, ReachabilityProbe, ReachabilityVerdict, SafetyProbe,
};
use shortguard::infrastructure::queue::MemoryQueue;

pub const WORK_QUEUE: &str = "url-validation";
pub const RESULT_QUEUE: &str = "url-validation-results";

/// Reachability stub returning a fixed verdict (or a fault when `None`).
pub struct StubReachabilityProbe {
    verdict: Option<ReachabilityVerdict>,
    calls: AtomicUsize,
}

impl StubReachabilityProbe {
    pub fn reachable() -> Self {
        Self::with_verdict(ReachabilityVerdict {
            reachable: true,
            status_code: Some(200),
            response_time_ms: Some(10),
            content_type: Some("text/html".to_string()),
            error_type: None,
        })
    }

    pub fn dns_failure() -> Self {
        Self::with_verdict(ReachabilityVerdict {
            reachable: false,
            status_code: None,
            response_time_ms: Some(25),
            content_type: None,
            error_type: Some(ProbeErrorKind::DnsError),
        })
    }

    pub fn faulting() -> Self {
        Self {
            verdict: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_verdict(verdict: ReachabilityVerdict) -> Self {
        Self {
            verdict: Some(verdict),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReachabilityProbe for StubReachabilityProbe {
    async fn probe(&self, _url: &CanonicalUrl) -> Result<ReachabilityVerdict, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.verdict {
            Some(verdict) => Ok(verdict.clone()),
            None => Err(AppError::internal("probe fault")),
        }
    }
}

/// Safety stub returning a fixed verdict (or an undetermined error when
/// `None`).
pub struct StubSafetyProbe {
    verdict: Option<bool>,
    calls: AtomicUsize,
}

impl StubSafetyProbe {
    pub fn clean() -> Self {
        Self {
            verdict: Some(true),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn flagged() -> Self {
        Self {
            verdict: Some(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn undetermined() -> Self {
        Self {
            verdict: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SafetyProbe for StubSafetyProbe {
    async fn check(&self, _url: &CanonicalUrl) -> Result<bool, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.verdict {
            Some(verdict) => Ok(verdict),
            None => Err(AppError::SafeBrowsing("no verdict".to_string())),
        }
    }
}

/// Geo provider stub with a fixed answer and a call counter.
pub struct StubGeoProvider {
    name: &'static str,
    details: Option<GeoDetails>,
    calls: AtomicUsize,
}

impl StubGeoProvider {
    pub fn returning(name: &'static str, details: GeoDetails) -> Self {
        Self {
            name,
            details: Some(details),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(name: &'static str) -> Self {
        Self {
            name,
            details: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GeoProvider for StubGeoProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn lookup(&self, _ip: &str) -> Result<GeoDetails, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.details {
            Some(details) => Ok(details.clone()),
            None => Err(AppError::internal("provider down")),
        }
    }
}

/// Plain map-backed cache for integration tests. TTLs are accepted but never
/// expire within a test run.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl KeyValueCache for MemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str, _ttl: Duration) -> CacheResult<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

/// A fully wired in-process validation pipeline over loopback queues.
pub struct TestPipeline {
    pub broker: MemoryQueue,
    pub orchestrator: Arc<ValidationOrchestrator>,
    pub reachability: Arc<StubReachabilityProbe>,
    pub safety: Arc<StubSafetyProbe>,
    handles: Vec<JoinHandle<()>>,
}

impl TestPipeline {
    pub fn start(
        reachability: StubReachabilityProbe,
        safety: StubSafetyProbe,
        limiter: TokenBucket,
    ) -> Self {
        let broker = MemoryQueue::new();
        let store = Arc::new(InMemoryJobStore::new());
        let reachability = Arc::new(reachability);
        let safety = Arc::new(safety);

        let orchestrator = Arc::new(ValidationOrchestrator::new(
            store,
            Arc::new(broker.clone()),
            WORK_QUEUE,
        ));

        let worker = Arc::new(
            ValidationWorker::new(
                reachability.clone(),
                safety.clone(),
                Arc::new(limiter),
                Arc::new(broker.clone()),
                WORK_QUEUE,
                RESULT_QUEUE,
            )
            .with_requeue_delay(Duration::from_millis(5)),
        );

        let sink = Arc::new(ResultSink::new(orchestrator.clone()));

        let mut handles = Vec::new();
        for _ in 0..2 {
            let worker = worker.clone();
            let consumer = Box::new(broker.consumer(WORK_QUEUE));
            handles.push(tokio::spawn(worker.run(consumer)));
        }
        let consumer = Box::new(broker.consumer(RESULT_QUEUE));
        handles.push(tokio::spawn(sink.run(consumer)));

        Self {
            broker,
            orchestrator,
            reachability,
            safety,
            handles,
        }
    }

    /// Polls until the job leaves Pending or the deadline passes.
    pub async fn wait_for_terminal(&self, job_id: Uuid) -> ValidationJob {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            let job = self
                .orchestrator
                .find(job_id)
                .await
                .unwrap()
                .expect("job must exist once enqueued");
            if job.status.is_terminal() {
                return job;
            }
            if tokio::time::Instant::now() > deadline {
                panic!("job {job_id} still {:?} after deadline", job.status);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Asserts the job is still Pending after giving the pipeline time to
    /// act.
    pub async fn assert_stays_pending(&self, job_id: Uuid) {
        tokio::time::sleep(Duration::from_millis(200)).await;
        let job = self.orchestrator.find(job_id).await.unwrap().unwrap();
        assert_eq!(job.status, UrlSafety::Pending);
    }
}

impl Drop for TestPipeline {
    fn drop(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}
