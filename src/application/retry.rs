//! Bounded-attempt retry policy for external calls.
//!
//! Wraps `tokio_retry` with a fixed wait between attempts and an explicit
//! retryable-error predicate, so probers retry transient network failures
//! without masking deterministic ones.

use std::future::Future;
use std::time::Duration;

use tokio_retry::strategy::FixedInterval;
use tokio_retry::RetryIf;

use crate::error::AppError;

/// Executes an operation at most `max_attempts` times, waiting a constant
/// duration between attempts.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    wait: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, wait: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            wait,
        }
    }

    /// Builds a policy from configuration values, parsing the wait duration
    /// from its ISO-8601 form (`PT1S`, `PT0.5S`, `PT1M30S`).
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidInput`] when the duration cannot be parsed.
    pub fn from_config(max_attempts: u32, wait_duration: &str) -> Result<Self, AppError> {
        let wait = parse_iso8601_duration(wait_duration).ok_or_else(|| {
            AppError::invalid_input(format!("invalid retry wait duration '{wait_duration}'"))
        })?;
        Ok(Self::new(max_attempts, wait))
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Runs `op`, retrying while `retryable` approves the error.
    ///
    /// The final error propagates unchanged once attempts are exhausted or
    /// the predicate rejects an error.
    pub async fn run<T, E, F, Fut, P>(&self, op: F, retryable: P) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: FnMut(&E) -> bool,
    {
        let strategy = FixedInterval::new(self.wait).take(self.max_attempts as usize - 1);
        RetryIf::spawn(strategy, op, retryable).await
    }
}

/// Parses a duration of the form `PT[nH][nM][nS]` (case-insensitive,
/// fractional seconds allowed). Date components are not supported.
fn parse_iso8601_duration(input: &str) -> Option<Duration> {
    let s = input.trim().to_ascii_uppercase();
    let body = s.strip_prefix("PT")?;
    if body.is_empty() {
        return None;
    }

    let mut total = Duration::ZERO;
    let mut number = String::new();
    for c in body.chars() {
        match c {
            '0'..='9' | '.' => number.push(c),
            'H' | 'M' | 'S' => {
                let value: f64 = number.parse().ok()?;
                number.clear();
                let unit_secs = match c {
                    'H' => 3600.0,
                    'M' => 60.0,
                    _ => 1.0,
                };
                total += Duration::from_secs_f64(value * unit_secs);
            }
            _ => return None,
        }
    }
    if !number.is_empty() {
        return None;
    }
    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_parse_iso8601_durations() {
        assert_eq!(parse_iso8601_duration("PT1S"), Some(Duration::from_secs(1)));
        assert_eq!(
            parse_iso8601_duration("PT0.5S"),
            Some(Duration::from_millis(500))
        );
        assert_eq!(
            parse_iso8601_duration("PT1M30S"),
            Some(Duration::from_secs(90))
        );
        assert_eq!(
            parse_iso8601_duration("PT2H"),
            Some(Duration::from_secs(7200))
        );
        assert_eq!(parse_iso8601_duration("pt1s"), Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_iso8601_duration("").is_none());
        assert!(parse_iso8601_duration("PT").is_none());
        assert!(parse_iso8601_duration("1S").is_none());
        assert!(parse_iso8601_duration("PT5").is_none());
        assert!(parse_iso8601_duration("P1D").is_none());
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let attempts = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(3, Duration::from_millis(1));

        let counter = attempts.clone();
        let result: Result<u32, &str> = policy
            .run(
                move || {
                    let counter = counter.clone();
                    async move {
                        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                        if n < 3 { Err("transient") } else { Ok(n) }
                    }
                },
                |_| true,
            )
            .await;

        assert_eq!(result, Ok(3));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausts_attempts_and_propagates_error() {
        let attempts = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(3, Duration::from_millis(1));

        let counter = attempts.clone();
        let result: Result<(), &str> = policy
            .run(
                move || {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Err("always")
                    }
                },
                |_| true,
            )
            .await;

        assert_eq!(result, Err("always"));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_error_fails_fast() {
        let attempts = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(5, Duration::from_millis(1));

        let counter = attempts.clone();
        let result: Result<(), &str> = policy
            .run(
                move || {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Err("permanent")
                    }
                },
                |e: &&str| *e != "permanent",
            )
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_from_config() {
        let policy = RetryPolicy::from_config(4, "PT2S").unwrap();
        assert_eq!(policy.max_attempts(), 4);
        assert!(RetryPolicy::from_config(4, "soon").is_err());
    }
}
