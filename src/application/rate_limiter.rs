//! Token-bucket rate limiter for the external safety API.
//!
//! One bucket is shared by all validation workers in the process. The bucket
//! must stay sized below the external API's true limit when multiple
//! processes run; fleet-wide coordination is out of scope.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Point-in-time view of the bucket, for operational surfaces.
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitStatus {
    /// Tokens currently available.
    pub remaining: u32,
    /// When the next refill lands.
    pub resets_at: Instant,
    /// Whether a consume attempt would currently be refused.
    pub limit_exceeded: bool,
}

struct BucketState {
    tokens: u32,
    last_refill: Instant,
}

/// Classical token bucket: capacity `C`, refilled by `R` tokens every period.
///
/// `try_consume` never blocks or awaits; callers that are refused re-enqueue
/// their work instead of waiting on the bucket.
pub struct TokenBucket {
    capacity: u32,
    refill_tokens: u32,
    refill_period: Duration,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    /// Creates a full bucket.
    ///
    /// `capacity` and `refill_tokens` are clamped to at least 1 so a
    /// misconfigured bucket degrades to a slow limiter rather than a
    /// permanent refusal.
    pub fn new(capacity: u32, refill_tokens: u32, refill_period: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            refill_tokens: refill_tokens.max(1),
            refill_period: refill_period.max(Duration::from_millis(1)),
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Takes one token if available. Non-blocking.
    pub fn try_consume(&self) -> bool {
        let mut state = self.state.lock().expect("token bucket lock poisoned");
        self.refill(&mut state, Instant::now());

        if state.tokens > 0 {
            state.tokens -= 1;
            true
        } else {
            false
        }
    }

    /// Reports the current bucket state without consuming anything.
    pub fn status(&self) -> RateLimitStatus {
        let mut state = self.state.lock().expect("token bucket lock poisoned");
        self.refill(&mut state, Instant::now());

        RateLimitStatus {
            remaining: state.tokens,
            resets_at: state.last_refill + self.refill_period,
            limit_exceeded: state.tokens == 0,
        }
    }

    /// Credits every refill period that elapsed since the last one, capped at
    /// capacity. `last_refill` advances by whole periods only, so partial
    /// periods are never lost.
    fn refill(&self, state: &mut BucketState, now: Instant) {
        let elapsed = now.duration_since(state.last_refill);
        let periods = (elapsed.as_nanos() / self.refill_period.as_nanos().max(1))
            .min(u32::MAX as u128) as u32;
        if periods == 0 {
            return;
        }

        let credit = periods.saturating_mul(self.refill_tokens);
        state.tokens = state.tokens.saturating_add(credit).min(self.capacity);
        state.last_refill += self.refill_period * periods;
    }
}
