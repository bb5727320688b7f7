use std::future::Future;
use std::time::Duration;

use docsmith_core::ClassifiedError;
use tracing::warn;

use crate::transport::BoxFuture;

pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Bounded linear backoff. The delay before retry `n` (1-based) is
/// `base_delay * n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// No retries at all.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn delay_before(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(retry)
    }

    /// Sum of every delay when all retries are used.
    pub fn total_delay(&self) -> Duration {
        (1..=self.max_retries).map(|n| self.delay_before(n)).sum()
    }
}

/// Injected delay, so backoff can be observed without real timers.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Run `operation`, retrying only `NetworkTransient` failures.
///
/// `operation` receives the 0-based attempt number. When retries run out
/// the last error is returned unchanged.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    mut operation: F,
) -> Result<T, ClassifiedError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, ClassifiedError>>,
{
    let mut attempt = 0;
    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < policy.max_retries => {
                attempt += 1;
                let delay = policy.delay_before(attempt);
                warn!(
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "transient failure, retrying"
                );
                sleeper.sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}
