//! Bounded retry of fallible source fetches.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::api::SourceError;

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Classifies failures that must never be retried.
pub trait Retryable {
    fn is_terminal(&self) -> bool;
}

impl Retryable for SourceError {
    fn is_terminal(&self) -> bool {
        SourceError::is_terminal(self)
    }
}

/// How many times a fetch is retried, and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// Delay before the first retry, doubled on each further retry.
    /// Zero retries immediately.
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    pub fn with_backoff(mut self, initial_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }

    /// Run `fetch` until it succeeds, fails terminally, or the retry budget
    /// is spent. The last error is returned once exhausted.
    pub async fn run<T, E, F, Fut>(&self, mut fetch: F) -> Result<T, E>
    where
        E: Retryable + std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut remaining = self.max_retries;
        let mut backoff = self.initial_backoff;

        loop {
            match fetch().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_terminal() => {
                    debug!(error = %e, "Terminal failure, not retrying");
                    return Err(e);
                }
                Err(e) if remaining == 0 => {
                    warn!(error = %e, max_retries = self.max_retries, "Retries exhausted");
                    return Err(e);
                }
                Err(e) => {
                    remaining -= 1;
                    warn!(
                        error = %e,
                        retry = self.max_retries - remaining,
                        backoff_ms = backoff.as_millis() as u64,
                        "Fetch failed, retrying"
                    );
                    if !backoff.is_zero() {
                        tokio::time::sleep(backoff).await;
                        backoff *= 2;
                    }
                }
            }
        }
    }
}

/// Retry `fetch` up to `max_retries` times without delay.
pub async fn retry_until_success<T, E, F, Fut>(fetch: F, max_retries: u32) -> Result<T, E>
where
    E: Retryable + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    RetryPolicy::new(max_retries).run(fetch).await
}
