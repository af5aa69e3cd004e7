//! Bounded retry with exponential backoff.
//!
//! [`retry_with_policy`] wraps one logical operation (a full request/response
//! cycle) with bounded retry. The caller supplies a classifier predicate
//! deciding which failures are transient; non-retryable failures and the
//! final failure after exhaustion surface unchanged.

use std::future::Future;
use std::time::{Duration, Instant};

use rand::Rng;

/// Retry configuration for one logical call.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Values of 0 and 1 both mean a
    /// single attempt.
    pub max_attempts: u32,

    /// Backoff for the first retry; doubles each subsequent retry.
    pub base_delay: Duration,

    /// Ceiling for the backoff schedule.
    pub max_delay: Duration,

    /// When set, subtract a random fraction (up to half) from each delay to
    /// spread synchronized retries.
    pub jitter: bool,

    /// Cumulative bound across all attempts of the call. When the elapsed
    /// time plus the next backoff would exceed it, retrying stops and the
    /// last failure surfaces. `None` bounds attempts only.
    pub overall_deadline: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            jitter: false,
            overall_deadline: None,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_overall_deadline(mut self, deadline: Duration) -> Self {
        self.overall_deadline = Some(deadline);
        self
    }

    /// Backoff duration after the given 1-based attempt index.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let raw = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(exponent));
        let floor = self.base_delay.min(self.max_delay);
        let capped = raw.min(self.max_delay).max(floor);

        if self.jitter {
            let half = capped / 2;
            let jitter_ms = rand::thread_rng().gen_range(0..=half.as_millis() as u64);
            capped - Duration::from_millis(jitter_ms)
        } else {
            capped
        }
    }
}

/// Run `op` under `policy`, retrying failures that `is_retryable` classifies
/// as transient.
///
/// The operation's success value, a non-retryable failure, or the last
/// failure after exhausting attempts is returned unchanged.
pub async fn retry_with_policy<T, E, F, Fut, C>(
    policy: &RetryPolicy,
    is_retryable: C,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    C: Fn(&E) -> bool,
{
    let started = Instant::now();
    let mut attempt: u32 = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= policy.max_attempts || !is_retryable(&err) {
                    return Err(err);
                }

                let delay = policy.backoff_for(attempt);
                if let Some(deadline) = policy.overall_deadline {
                    if started.elapsed() + delay >= deadline {
                        return Err(err);
                    }
                }

                tracing::debug!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "transient failure, backing off before retry"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_attempts(max_attempts)
            .with_base_delay(Duration::from_millis(1))
            .with_max_delay(Duration::from_millis(4))
    }

    #[derive(Debug, PartialEq)]
    struct TestError {
        retryable: bool,
        tag: u32,
    }

    #[test]
    fn test_backoff_schedule_is_exponential_and_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_for(1), Duration::from_secs(1));
        assert_eq!(policy.backoff_for(2), Duration::from_secs(2));
        assert_eq!(policy.backoff_for(3), Duration::from_secs(4));
        assert_eq!(policy.backoff_for(4), Duration::from_secs(8));
        assert_eq!(policy.backoff_for(5), Duration::from_secs(10));
        assert_eq!(policy.backoff_for(20), Duration::from_secs(10));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let policy = RetryPolicy::default().with_jitter(true);
        for _ in 0..50 {
            let delay = policy.backoff_for(3);
            assert!(delay >= Duration::from_secs(2));
            assert!(delay <= Duration::from_secs(4));
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result: Result<&str, TestError> =
            retry_with_policy(&fast_policy(4), |e: &TestError| e.retryable, || async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n <= 3 {
                    Err(TestError { retryable: true, tag: n })
                } else {
                    Ok("done")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_exhaustion_surfaces_last_error() {
        let calls = AtomicU32::new(0);
        let result: Result<(), TestError> =
            retry_with_policy(&fast_policy(3), |e: &TestError| e.retryable, || async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Err(TestError { retryable: true, tag: n })
            })
            .await;

        assert_eq!(result.unwrap_err(), TestError { retryable: true, tag: 3 });
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_fails_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<(), TestError> =
            retry_with_policy(&fast_policy(5), |e: &TestError| e.retryable, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(TestError { retryable: false, tag: 1 })
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_overall_deadline_stops_retrying() {
        // First backoff (1ms minimum scaled up here) would exceed the
        // deadline, so only one attempt is made.
        let policy = RetryPolicy::default()
            .with_max_attempts(5)
            .with_base_delay(Duration::from_millis(50))
            .with_overall_deadline(Duration::from_millis(10));

        let calls = AtomicU32::new(0);
        let result: Result<(), TestError> =
            retry_with_policy(&policy, |e: &TestError| e.retryable, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(TestError { retryable: true, tag: 7 })
            })
            .await;

        assert_eq!(result.unwrap_err().tag, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_max_attempts_still_attempts_once() {
        let calls = AtomicU32::new(0);
        let result: Result<(), TestError> =
            retry_with_policy(&fast_policy(0), |e: &TestError| e.retryable, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(TestError { retryable: true, tag: 1 })
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
