//! Bounded retry for remote calls
//!
//! Retries an async operation while its error is transient, up to a fixed
//! number of attempts. Permanent errors are returned immediately.
//!
//! **Backoff Strategy:**
//! - `fixed`: same pause between every attempt (image downloads)
//! - `exponential`: pause doubles after each failure, capped (LLM requests)

use std::future::Future;
use std::time::Duration;

/// Errors that can tell whether a retry may help
pub trait Transient {
    fn is_transient(&self) -> bool;
}

/// How many times to try and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first (treated as at least 1)
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Delay multiplier applied after each failed attempt
    pub multiplier: u32,
}

impl RetryPolicy {
    /// Same delay between all attempts
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay: delay,
            max_delay: delay,
            multiplier: 1,
        }
    }

    /// Doubling delay starting at `initial_delay`, capped at `max_delay`
    pub fn exponential(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
            max_delay,
            multiplier: 2,
        }
    }

    /// Single attempt, no retry
    pub fn none() -> Self {
        Self::fixed(1, Duration::ZERO)
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay after the given failed attempt (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = self
            .multiplier
            .max(1)
            .saturating_pow(attempt.saturating_sub(1));
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

/// Final error together with the number of attempts made
#[derive(Debug)]
pub struct RetryFailure<E> {
    pub attempts: u32,
    pub error: E,
}

/// Run `operation` until it succeeds, fails permanently, or attempts run out
///
/// # Arguments
/// * `operation_name` - Name for logging (e.g., "image download")
/// * `policy` - Attempt count and backoff
/// * `operation` - Async closure performing one attempt
pub async fn retry_transient<F, Fut, T, E>(
    operation_name: &str,
    policy: RetryPolicy,
    mut operation: F,
) -> Result<T, RetryFailure<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Transient + std::fmt::Display,
{
    let max_attempts = policy.attempts();
    let mut attempt = 0;

    loop {
        attempt += 1;

        tracing::debug!(
            operation = operation_name,
            attempt,
            max_attempts,
            "Attempting remote call"
        );

        match operation(attempt).await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(
                        operation = operation_name,
                        attempt,
                        "Remote call succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(error) => {
                if !error.is_transient() {
                    // Permanent error, fail immediately
                    return Err(RetryFailure { attempts: attempt, error });
                }

                if attempt >= max_attempts {
                    tracing::error!(
                        operation = operation_name,
                        attempt,
                        error = %error,
                        "Remote call failed: attempts exhausted"
                    );
                    return Err(RetryFailure { attempts: attempt, error });
                }

                let delay = policy.delay_after(attempt);
                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Remote call failed, will retry after backoff"
                );

                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    enum TestError {
        Flaky,
        Fatal,
    }

    impl fmt::Display for TestError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    impl Transient for TestError {
        fn is_transient(&self) -> bool {
            matches!(self, TestError::Flaky)
        }
    }

    #[tokio::test]
    async fn test_retry_succeeds_first_attempt() {
        let result = retry_transient("test_op", RetryPolicy::fixed(3, Duration::ZERO), |_| async {
            Ok::<i32, TestError>(42)
        })
        .await;

        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_retry_succeeds_after_transient_errors() {
        let mut calls = 0;

        let result = retry_transient("test_op", RetryPolicy::fixed(3, Duration::ZERO), |attempt| {
            calls += 1;
            async move {
                if attempt < 3 {
                    Err(TestError::Flaky)
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn test_retry_stops_at_max_attempts() {
        let mut calls = 0;

        let result = retry_transient("test_op", RetryPolicy::fixed(3, Duration::ZERO), |_| {
            calls += 1;
            async { Err::<i32, TestError>(TestError::Flaky) }
        })
        .await;

        let failure = result.unwrap_err();
        assert_eq!(failure.attempts, 3);
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn test_permanent_error_fails_immediately() {
        let mut calls = 0;

        let result = retry_transient("test_op", RetryPolicy::fixed(5, Duration::ZERO), |_| {
            calls += 1;
            async { Err::<i32, TestError>(TestError::Fatal) }
        })
        .await;

        let failure = result.unwrap_err();
        assert!(matches!(failure.error, TestError::Fatal));
        assert_eq!(failure.attempts, 1);
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_tries_once() {
        let mut calls = 0;

        let result = retry_transient("test_op", RetryPolicy::fixed(0, Duration::ZERO), |_| {
            calls += 1;
            async { Err::<i32, TestError>(TestError::Flaky) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_fixed_delay_is_applied_between_attempts() {
        let start = std::time::Instant::now();

        let _ = retry_transient("test_op", RetryPolicy::fixed(3, Duration::from_millis(50)), |_| async {
            Err::<i32, TestError>(TestError::Flaky)
        })
        .await;

        // Two pauses between three attempts
        assert!(start.elapsed() >= Duration::from_millis(95));
    }

    #[test]
    fn test_exponential_delay_doubles_and_caps() {
        let policy = RetryPolicy::exponential(6, Duration::from_millis(500), Duration::from_secs(8));
        assert_eq!(policy.delay_after(1), Duration::from_millis(500));
        assert_eq!(policy.delay_after(2), Duration::from_millis(1000));
        assert_eq!(policy.delay_after(3), Duration::from_millis(2000));
        assert_eq!(policy.delay_after(5), Duration::from_secs(8));
        assert_eq!(policy.delay_after(40), Duration::from_secs(8));
    }

    #[test]
    fn test_fixed_delay_constant() {
        let policy = RetryPolicy::fixed(3, Duration::from_secs(2));
        assert_eq!(policy.delay_after(1), Duration::from_secs(2));
        assert_eq!(policy.delay_after(2), Duration::from_secs(2));
    }
}
