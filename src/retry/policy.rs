//! Retry policy
//!
//! Wraps an upstream call and re-invokes it while the classifier says the
//! failure is transient. Waits come from [`BackoffConfig`] and are never
//! jittered, so test timings are reproducible.

use super::classify::Verdict;
use crate::config::BackoffConfig;
use crate::error::{Error, Result};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// Retry policy driven by the error classifier
#[derive(Debug, Default)]
pub struct RetryPolicy {
    backoff: BackoffConfig,
    retries: AtomicU64,
}

impl RetryPolicy {
    /// Create a policy from a backoff configuration
    pub fn new(backoff: BackoffConfig) -> Self {
        Self {
            backoff,
            retries: AtomicU64::new(0),
        }
    }

    /// The backoff configuration in use
    pub fn backoff(&self) -> &BackoffConfig {
        &self.backoff
    }

    /// Total retries performed so far
    pub fn retries(&self) -> u64 {
        self.retries.load(Ordering::Relaxed)
    }

    /// Run `op` until it succeeds, fails for good, or runs out of attempts.
    ///
    /// - Retryable upstream errors sleep and retry, up to `max_attempts` total
    ///   attempts, then become [`Error::RetriesExhausted`].
    /// - Expected-empty upstream errors come back as [`Error::ExpectedEmpty`]
    ///   without a retry; the caller decides the fallback.
    /// - Everything else is returned untouched on the first failure.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.backoff.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let api_err = match op().await {
                Ok(value) => return Ok(value),
                Err(Error::Api(api_err)) => api_err,
                Err(other) => return Err(other),
            };

            match super::classify(&api_err) {
                Verdict::Fatal => return Err(Error::Api(api_err)),
                Verdict::ExpectedEmpty => {
                    debug!(
                        operation,
                        code = ?api_err.code,
                        subcode = ?api_err.error_subcode,
                        "Upstream returned an expected-empty error"
                    );
                    return Err(Error::ExpectedEmpty(api_err));
                }
                Verdict::Retryable if attempt >= max_attempts => {
                    warn!(
                        operation,
                        attempts = attempt,
                        "Giving up on retryable error: {api_err}"
                    );
                    return Err(Error::RetriesExhausted {
                        attempts: attempt,
                        last: api_err,
                    });
                }
                Verdict::Retryable => {
                    let wait = self.backoff.delay_for(attempt);
                    warn!(
                        operation,
                        attempt,
                        max_attempts,
                        code = ?api_err.code,
                        subcode = ?api_err.error_subcode,
                        wait_ms = wait.as_millis() as u64,
                        "Caught retryable error after {attempt} tries, waiting {wait:?} then retrying: {api_err}"
                    );
                    self.retries.fetch_add(1, Ordering::Relaxed);
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}
