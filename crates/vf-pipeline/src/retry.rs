//! Bounded retry with configurable backoff.
//!
//! [`retry`] drives an operation that can succeed, ask to be retried, or fail
//! outright. Between retries it suspends through a [`Sleeper`] so tests can
//! observe the exact backoff schedule without waiting for it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

/// How many times to try and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn exponential(
        max_attempts: u32,
        initial_delay: Duration,
        multiplier: f64,
        max_delay: Duration,
    ) -> Self {
        Self {
            max_attempts,
            initial_delay,
            multiplier,
            max_delay,
        }
    }

    /// Constant `interval` between attempts.
    pub fn fixed(interval: Duration, max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: interval,
            multiplier: 1.0,
            max_delay: interval,
        }
    }

    /// Delay after the `attempt`-th failed attempt (1-based):
    /// `min(initial * multiplier^(attempt-1), max_delay)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.initial_delay.as_secs_f64() * self.multiplier.powi(exp);
        let cap = self.max_delay.as_secs_f64();
        if !secs.is_finite() || secs >= cap {
            return self.max_delay;
        }
        Duration::from_secs_f64(secs.max(0.0))
    }
}

impl Default for RetryPolicy {
    /// Analysis query defaults: 10 attempts, 3 s growing by 1.5x, capped at 30 s.
    fn default() -> Self {
        Self::exponential(10, Duration::from_secs(3), 1.5, Duration::from_secs(30))
    }
}

/// Outcome of a single attempt that did not fail fatally.
#[derive(Debug, Clone, PartialEq)]
pub enum Attempt<T> {
    Done(T),
    /// Try again; the reason is logged and reported on exhaustion.
    Retry(String),
}

/// Failure of a [`retry`] loop.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryError<E> {
    Exhausted { attempts: u32, last_reason: String },
    Fatal(E),
}

/// Suspension point between attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Records requested durations and returns immediately.
///
/// Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    calls: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every duration requested so far, in order.
    pub fn calls(&self) -> Vec<Duration> {
        self.calls.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Sum of all requested durations.
    pub fn total(&self) -> Duration {
        self.calls.lock().iter().sum()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.calls.lock().push(duration);
    }
}

/// Run `op` until it returns [`Attempt::Done`], fails, or the policy's
/// attempt budget is spent.
///
/// `op` receives the 1-based attempt number. No sleep follows the final
/// attempt.
pub async fn retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Attempt<T>, E>>,
{
    let mut last_reason = String::from("no attempts allowed");

    for attempt in 1..=policy.max_attempts {
        match op(attempt).await {
            Ok(Attempt::Done(value)) => return Ok(value),
            Ok(Attempt::Retry(reason)) => {
                if attempt < policy.max_attempts {
                    let delay = policy.delay_for(attempt);
                    tracing::debug!(
                        attempt,
                        max_attempts = policy.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        reason = %reason,
                        "retrying"
                    );
                    sleeper.sleep(delay).await;
                }
                last_reason = reason;
            }
            Err(e) => return Err(RetryError::Fatal(e)),
        }
    }

    Err(RetryError::Exhausted {
        attempts: policy.max_attempts,
        last_reason,
    })
}
