//! Bounded exponential backoff for idempotent reads.

use super::errors::ApiResult;
use std::future::Future;
use std::time::Duration;

/// Backoff policy; `max_attempts` counts the first try
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_millis(2000),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no backoff
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (1-based), doubling up to `max_delay`
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let factor = 2u32.saturating_pow(attempt - 1);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Whether a failed attempt may be followed by another
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// policy's attempts are exhausted.
///
/// # Arguments
///
/// * `policy` - Backoff policy
/// * `label` - Operation name used in log lines
/// * `op` - Called with the 1-based attempt number
pub async fn with_retry<F, Fut, T>(policy: RetryPolicy, label: &str, mut op: F) -> ApiResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = ApiResult<T>>,
{
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Err(e) if e.is_retryable() && policy.should_retry(attempt) => {
                let delay = policy.delay_for_attempt(attempt);
                log::warn!(
                    "{label} failed on attempt {attempt}/{}: {e}; retrying in {delay:?}",
                    policy.max_attempts
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                if attempt > 1 {
                    log::warn!("{label} giving up after {attempt} attempts: {e}");
                }
                return Err(e);
            }
            Ok(value) => return Ok(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
        }
    }

    #[test]
    fn test_delay_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for_attempt(0), Duration::ZERO);
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(400));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(800));
        assert_eq!(policy.delay_for_attempt(10), Duration::from_millis(2000));
        assert_eq!(policy.delay_for_attempt(u32::MAX), Duration::from_millis(2000));
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let calls = &AtomicU32::new(0);
        let result = with_retry(fast(), "GET /x", move |_| async move {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(ApiError::Timeout)
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_stops_at_max_attempts() {
        let calls = &AtomicU32::new(0);
        let result: ApiResult<()> = with_retry(fast(), "GET /x", move |_| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ApiError::from_status(503, ""))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_client_errors_not_retried() {
        let calls = &AtomicU32::new(0);
        let result: ApiResult<()> = with_retry(fast(), "GET /x", move |_| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ApiError::from_status(404, r#"{"error":"gone"}"#))
        })
        .await;

        assert_eq!(result.unwrap_err().user_message(), "gone");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_none_policy_tries_once() {
        let calls = &AtomicU32::new(0);
        let _: ApiResult<()> = with_retry(RetryPolicy::none(), "POST /x", move |_| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ApiError::Timeout)
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
