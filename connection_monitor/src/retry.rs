//! Fixed-delay retry policy shared by probes and the relay

use crate::errors::{MonitorError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    retries: u32,
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2, Duration::from_millis(1000))
    }
}

impl RetryPolicy {
    pub fn new(retries: u32, delay: Duration) -> Self {
        Self { retries, delay }
    }

    /// Total number of attempts, first try included
    pub fn max_attempts(&self) -> u32 {
        self.retries + 1
    }

    /// Run `operation` until it succeeds or all attempts are used up.
    ///
    /// The closure receives the zero-based attempt number. The returned
    /// error is the one produced by the final attempt.
    pub async fn run<T, F, Fut>(&self, label: &str, operation: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.run_while(label, operation, |_| true).await
    }

    /// Like [`RetryPolicy::run`], but stops early when `should_retry`
    /// returns false for an error.
    pub async fn run_while<T, F, Fut, P>(
        &self,
        label: &str,
        mut operation: F,
        should_retry: P,
    ) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
        P: Fn(&MonitorError) -> bool,
    {
        let mut attempt = 0;

        loop {
            match operation(attempt).await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!("{} succeeded on attempt {}", label, attempt + 1);
                    }
                    return Ok(value);
                }
                Err(e) => {
                    attempt += 1;

                    if attempt >= self.max_attempts() || !should_retry(&e) {
                        return Err(e);
                    }

                    warn!(
                        "{} failed (attempt {}), retrying in {}ms: {}",
                        label,
                        attempt,
                        self.delay.as_millis(),
                        e
                    );
                    sleep(self.delay).await;
                }
            }
        }
    }
}
