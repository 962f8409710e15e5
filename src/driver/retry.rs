//! Retry with exponential backoff.
//!
//! Only transient failures (see [`DriverError::is_transient`]) are
//! retried; everything else surfaces on the first attempt.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::debug;

use super::config::Config;
use super::error::{DriverError, DriverResult};

/// Backoff policy for [`with_retry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base: Duration,
    pub max_delay: Duration,
    /// Add up to 25% of the computed delay.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_retries: config.max_retries,
            base: config.retry_base,
            max_delay: config.retry_max_delay,
            jitter: config.retry_jitter,
        }
    }

    /// Delay before retry number `attempt` (0-based):
    /// `min(base * 2^attempt, max)` plus optional jitter.
    pub fn delay(&self, attempt: u32) -> Duration {
        let exp = self
            .base
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_delay);
        if !self.jitter || exp.is_zero() {
            return exp;
        }
        let spread = (exp.as_millis() as u64 / 4).max(1);
        exp + Duration::from_millis(rand::thread_rng().gen_range(0..spread))
    }
}

/// Run `op`, retrying transient failures with exponential backoff.
pub async fn with_retry<F, Fut, T>(policy: RetryPolicy, mut op: F) -> DriverResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = DriverResult<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < policy.max_retries => {
                let delay = policy.delay(attempt);
                debug!(attempt, ?delay, "transient failure, backing off: {e}");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn no_jitter() -> RetryPolicy {
        RetryPolicy {
            jitter: false,
            ..RetryPolicy::default()
        }
    }

    fn transient() -> DriverError {
        DriverError::Connection("refused".into())
    }

    #[test]
    fn delay_doubles_then_caps() {
        let policy = no_jitter();
        assert_eq!(policy.delay(0), Duration::from_millis(100));
        assert_eq!(policy.delay(1), Duration::from_millis(200));
        assert_eq!(policy.delay(2), Duration::from_millis(400));
        assert_eq!(policy.delay(5), Duration::from_millis(3200));
        assert_eq!(policy.delay(6), Duration::from_secs(5));
        assert_eq!(policy.delay(30), Duration::from_secs(5));
    }

    #[test]
    fn jitter_stays_within_quarter() {
        let policy = RetryPolicy::default();
        for attempt in 0..4 {
            let base = no_jitter().delay(attempt);
            for _ in 0..50 {
                let jittered = policy.delay(attempt);
                assert!(jittered >= base);
                assert!(jittered <= base + base / 4 + Duration::from_millis(1));
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let result = with_retry(no_jitter(), move || {
            let counter = Arc::clone(&counter);
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(transient())
                } else {
                    Ok(42)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_retries_for_persistent_transient_failure() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let result: DriverResult<()> = with_retry(no_jitter(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(transient()) }
        })
        .await;
        assert!(matches!(result, Err(DriverError::Connection(_))));
        // Initial attempt plus max_retries.
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn non_transient_fails_fast() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let result: DriverResult<()> = with_retry(no_jitter(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async {
                Err(DriverError::Cypher {
                    code: "Neo.ClientError.Statement.SyntaxError".into(),
                    message: "bad".into(),
                })
            }
        })
        .await;
        assert!(matches!(result, Err(DriverError::Cypher { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
