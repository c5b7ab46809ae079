//! Retry Policy
//!
//! Linear-backoff retry for provider calls. Only errors the provider
//! marks retryable are retried; everything else fails fast.

use std::future::Future;
use std::time::Duration;

use crate::error::Result;

/// Timeout applied to every individual provider request
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Attempt count and backoff base for provider calls
///
/// The delay grows linearly: base, 2x base, 3x base, ...
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no delay; used by tests and latency-sensitive paths
    pub fn none() -> Self {
        Self {
            attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    /// Run `op` until it succeeds, the error is non-retryable, or
    /// attempts are exhausted.
    pub async fn run<T, F, Fut>(&self, label: &str, op: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 1u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    if attempt >= attempts || !error.is_retryable() {
                        return Err(error);
                    }
                    tracing::warn!(
                        label,
                        attempt,
                        error = %error,
                        "provider call failed, retrying"
                    );
                    tokio::time::sleep(self.base_delay * attempt).await;
                    attempt += 1;
                }
            }
        }
    }
}
