//! Bounded retry with a fixed delay, shared by every fetch and DOM lookup.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use scrape_logging::{scrape_error, scrape_warn};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    /// `max_attempts` is clamped to at least one attempt.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// Every attempt failed; carries the error of the last one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{label}: gave up after {attempts} attempts: {last_error}")]
pub struct RetryExhausted<E> {
    pub label: String,
    pub attempts: u32,
    pub last_error: E,
}

#[derive(Debug, Clone, Copy)]
pub struct RetryGovernor {
    policy: RetryPolicy,
}

impl RetryGovernor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy: RetryPolicy::new(policy.max_attempts, policy.delay),
        }
    }

    /// Run `op` until it succeeds or `max_attempts` calls have failed.
    ///
    /// Logs a warning per failed attempt and an error on exhaustion. Sleeps
    /// `delay` between attempts; there is no sleep after the last one.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut op: F) -> Result<T, RetryExhausted<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let max = self.policy.max_attempts;
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    scrape_warn!("{label}: attempt {attempt}/{max} failed: {err}");
                    if attempt >= max {
                        scrape_error!("{label}: giving up after {max} attempts");
                        return Err(RetryExhausted {
                            label: label.to_string(),
                            attempts: attempt,
                            last_error: err,
                        });
                    }
                    tokio::time::sleep(self.policy.delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
