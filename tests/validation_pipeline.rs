//! End-to-end validation pipeline tests over loopback queues: submission
//! through workers and the result sink to a terminal job state.

mod common;

use std::time::Duration;

use common::{StubReachabilityProbe, StubSafetyProbe, TestPipeline};
use shortguard::application::rate_limiter::TokenBucket;
use shortguard::domain::entities::{UrlSafety, ValidationResult};
use shortguard::error::AppError;
use shortguard::infrastructure::queue::QueuePublisher;
use uuid::Uuid;

fn open_limiter() -> TokenBucket {
    TokenBucket::new(100, 100, Duration::from_secs(1))
}

#[tokio::test]
async fn test_clean_url_reaches_safe() {
    let pipeline = TestPipeline::start(
        StubReachabilityProbe::reachable(),
        StubSafetyProbe::clean(),
        open_limiter(),
    );

    let job_id = pipeline
        .orchestrator
        .enqueue("http://example.com/")
        .await
        .unwrap();

    let job = pipeline.wait_for_terminal(job_id).await;
    assert_eq!(job.status, UrlSafety::Safe);
    assert_eq!(job.url.as_str(), "http://example.com/");
    assert_eq!(pipeline.safety.calls(), 1);
    assert!(pipeline.reachability.calls() >= 1);
}

#[tokio::test]
async fn test_unreachable_url_skips_safety_probe() {
    let pipeline = TestPipeline::start(
        StubReachabilityProbe::dns_failure(),
        StubSafetyProbe::clean(),
        open_limiter(),
    );

    let job_id = pipeline
        .orchestrator
        .enqueue("http://unreachable.test/")
        .await
        .unwrap();

    let job = pipeline.wait_for_terminal(job_id).await;
    assert_eq!(job.status, UrlSafety::Unreachable);
    assert_eq!(pipeline.safety.calls(), 0);
}

#[tokio::test]
async fn test_flagged_url_reaches_unsafe() {
    let pipeline = TestPipeline::start(
        StubReachabilityProbe::reachable(),
        StubSafetyProbe::flagged(),
        open_limiter(),
    );

    let job_id = pipeline
        .orchestrator
        .enqueue("http://malware.test/")
        .await
        .unwrap();

    let job = pipeline.wait_for_terminal(job_id).await;
    assert_eq!(job.status, UrlSafety::Unsafe);
}

#[tokio::test]
async fn test_probe_fault_reaches_error() {
    let pipeline = TestPipeline::start(
        StubReachabilityProbe::faulting(),
        StubSafetyProbe::clean(),
        open_limiter(),
    );

    let job_id = pipeline
        .orchestrator
        .enqueue("http://example.com/")
        .await
        .unwrap();

    let job = pipeline.wait_for_terminal(job_id).await;
    assert_eq!(job.status, UrlSafety::Error);
    assert_eq!(pipeline.safety.calls(), 0);
}

#[tokio::test]
async fn test_unsupported_scheme_is_rejected_synchronously() {
    let pipeline = TestPipeline::start(
        StubReachabilityProbe::reachable(),
        StubSafetyProbe::clean(),
        open_limiter(),
    );

    let result = pipeline.orchestrator.enqueue("ftp://example.com/").await;
    assert!(matches!(result, Err(AppError::InvalidUrl(_))));

    // Nothing was probed for the rejected submission.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(pipeline.reachability.calls(), 0);
}

#[tokio::test]
async fn test_rate_limited_safety_requeues_until_token_available() {
    // One token already spent; refills slowly, so the safety message must
    // loop through the work queue at least once before being served.
    let limiter = TokenBucket::new(1, 1, Duration::from_millis(100));
    assert!(limiter.try_consume());

    let pipeline = TestPipeline::start(
        StubReachabilityProbe::reachable(),
        StubSafetyProbe::clean(),
        limiter,
    );

    let job_id = pipeline
        .orchestrator
        .enqueue("http://example.com/")
        .await
        .unwrap();

    let job = pipeline.wait_for_terminal(job_id).await;
    assert_eq!(job.status, UrlSafety::Safe);
    assert_eq!(pipeline.safety.calls(), 1);
}

#[tokio::test]
async fn test_undetermined_safety_leaves_job_pending() {
    let pipeline = TestPipeline::start(
        StubReachabilityProbe::reachable(),
        StubSafetyProbe::undetermined(),
        open_limiter(),
    );

    let job_id = pipeline
        .orchestrator
        .enqueue("http://example.com/")
        .await
        .unwrap();

    pipeline.assert_stays_pending(job_id).await;
}

#[tokio::test]
async fn test_duplicate_results_do_not_flip_terminal_state() {
    let pipeline = TestPipeline::start(
        StubReachabilityProbe::dns_failure(),
        StubSafetyProbe::clean(),
        open_limiter(),
    );

    let job_id = pipeline
        .orchestrator
        .enqueue("http://unreachable.test/")
        .await
        .unwrap();
    let job = pipeline.wait_for_terminal(job_id).await;
    assert_eq!(job.status, UrlSafety::Unreachable);

    // A late, conflicting verdict (redelivery, duplicate worker) is ignored.
    let stale = ValidationResult {
        job_id,
        status: UrlSafety::Safe,
    };
    pipeline
        .broker
        .publish(common::RESULT_QUEUE, serde_json::to_vec(&stale).unwrap())
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;
    let job = pipeline.orchestrator.find(job_id).await.unwrap().unwrap();
    assert_eq!(job.status, UrlSafety::Unreachable);
}

#[tokio::test]
async fn test_malformed_work_message_does_not_poison_the_queue() {
    let pipeline = TestPipeline::start(
        StubReachabilityProbe::reachable(),
        StubSafetyProbe::clean(),
        open_limiter(),
    );

    pipeline
        .broker
        .publish(common::WORK_QUEUE, b"definitely not json".to_vec())
        .await
        .unwrap();

    // A well-formed submission after the junk still completes.
    let job_id = pipeline
        .orchestrator
        .enqueue("http://example.com/")
        .await
        .unwrap();
    let job = pipeline.wait_for_terminal(job_id).await;
    assert_eq!(job.status, UrlSafety::Safe);
}

#[tokio::test]
async fn test_find_unknown_job_returns_none() {
    let pipeline = TestPipeline::start(
        StubReachabilityProbe::reachable(),
        StubSafetyProbe::clean(),
        open_limiter(),
    );

    let found = pipeline.orchestrator.find(Uuid::new_v4()).await.unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn test_hash_of_canonical_url_is_stable_across_submissions() {
    let pipeline = TestPipeline::start(
        StubReachabilityProbe::reachable(),
        StubSafetyProbe::clean(),
        open_limiter(),
    );

    let first = pipeline
        .orchestrator
        .enqueue("http://example.com")
        .await
        .unwrap();
    let second = pipeline
        .orchestrator
        .enqueue("HTTP://EXAMPLE.COM/")
        .await
        .unwrap();

    let first = pipeline.wait_for_terminal(first).await;
    let second = pipeline.wait_for_terminal(second).await;

    assert_eq!(first.url, second.url);
    assert_eq!(first.url.hash(), second.url.hash());
    assert_ne!(first.id, second.id);
}
