//! Bounded retry policy for external calls
//!
//! Every provider call goes through [`RetryPolicy::execute`]:
//! - Attempts: bounded by `max_attempts` (first call included)
//! - Backoff: fixed delay between attempts
//! - Deadline: optional per-attempt timeout, a timeout counts as a retryable failure

use crate::errors::{RagError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Default attempts: the first call plus one retry
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

/// Retry policy applied to a single kind of provider call
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,

    /// Wait before each retry
    pub delay: Duration,

    /// Per-attempt deadline
    pub timeout: Option<Duration>,
}

impl RetryPolicy {
    /// One retry after a fixed delay
    pub fn retry_once(delay: Duration) -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay,
            timeout: None,
        }
    }

    /// Attach a per-attempt deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Run `operation` until it succeeds, fails permanently, or attempts run out.
    ///
    /// The last error is returned unchanged so callers can still match on it.
    pub async fn execute<F, Fut, T>(&self, label: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let outcome = match self.timeout {
                Some(limit) => match tokio::time::timeout(limit, operation()).await {
                    Ok(result) => result,
                    Err(_) => Err(RagError::Timeout {
                        duration_ms: limit.as_millis() as u64,
                    }),
                },
                None => operation().await,
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) if attempt >= max_attempts => {
                    tracing::warn!("{label}: giving up after {attempt} attempt(s): {e}");
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(
                        "{label}: attempt {attempt}/{max_attempts} failed ({e}), retrying in {}ms",
                        self.delay.as_millis()
                    );
                    sleep(self.delay).await;
                }
            }
        }
    }
}
