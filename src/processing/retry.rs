//! Bounded retries with exponential backoff around summarizer calls.

use crate::config::Config;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Retry schedule applied at the summarizer call site.
///
/// Attempt 1 fires immediately. After failed attempt `k` the caller waits
/// `base_delay * 2^(k-1)`, clamped into `[min_delay, max_delay]`. The final error is returned
/// unchanged once `max_attempts` calls have failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of calls, including the first one.
    pub max_attempts: u32,
    /// Delay multiplied by powers of two.
    pub base_delay: Duration,
    /// Lower bound for any wait.
    pub min_delay: Duration,
    /// Upper bound for any wait.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_secs(1),
            min_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Build the policy from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.retry_max_attempts.max(1),
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
            min_delay: Duration::from_millis(config.retry_min_delay_ms),
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
        }
    }

    /// Policy that retries without waiting; handy for tests and batch tools.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::ZERO,
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Wait applied after the given (one-based) attempt failed.
    pub fn delay_after(&self, failed_attempt: u32) -> Duration {
        let exponent = failed_attempt.saturating_sub(1).min(31);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
            .max(self.min_delay)
    }

    /// Run `operation` until it succeeds or the attempt budget is spent.
    ///
    /// The closure receives the one-based attempt number.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(error) if attempt >= max_attempts => {
                    tracing::error!(
                        operation = label,
                        attempts = attempt,
                        %error,
                        "Giving up after exhausting retries"
                    );
                    return Err(error);
                }
                Err(error) => {
                    let delay = self.delay_after(attempt);
                    tracing::warn!(
                        operation = label,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        %error,
                        "Attempt failed; retrying"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn default_schedule_doubles_and_caps() {
        let policy = RetryPolicy::default();
        let delays: Vec<u64> = (1..=4)
            .map(|attempt| policy.delay_after(attempt).as_secs())
            .collect();
        assert_eq!(delays, vec![1, 2, 4, 5]);
    }

    #[test]
    fn delay_is_bounded_below_by_min_delay() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
            min_delay: Duration::from_millis(750),
            max_delay: Duration::from_secs(10),
        };
        assert_eq!(policy.delay_after(1), Duration::from_millis(750));
        assert_eq!(policy.delay_after(4), Duration::from_millis(800));
    }

    #[test]
    fn large_attempt_numbers_do_not_overflow() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(200), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn succeeds_on_kth_attempt_after_k_calls() {
        let policy = RetryPolicy::immediate(5);
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<&str, String> = policy
            .run("test", |attempt| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    if attempt < 3 {
                        Err(format!("failure {attempt}"))
                    } else {
                        Ok("summary")
                    }
                }
            })
            .await;

        assert_eq!(result, Ok("summary"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhaustion_returns_last_error_after_max_attempts() {
        let policy = RetryPolicy::immediate(4);
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), String> = policy
            .run("test", |attempt| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(format!("failure {attempt}"))
                }
            })
            .await;

        assert_eq!(result, Err("failure 4".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn zero_attempts_still_calls_once() {
        let policy = RetryPolicy {
            max_attempts: 0,
            ..RetryPolicy::immediate(1)
        };
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let _: Result<(), &str> = policy
            .run("test", |_| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err("nope")
                }
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
