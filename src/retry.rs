//! Bounded retry with exponential backoff for collaborator calls.
//!
//! Only failures that report themselves as [`Transient`] are retried:
//! network errors, timeouts, HTTP 429 / 5xx, and SQLite busy or pool
//! exhaustion. Everything else (a rejected image, a malformed response)
//! fails on the first attempt.
//!
//! Backoff doubles per attempt starting at `base_delay`, with the shift
//! capped at 2^5 and the result capped at `max_delay`.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Errors that can say whether trying again might help.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

impl Transient for anyhow::Error {
    fn is_transient(&self) -> bool {
        self.chain().any(|cause| {
            if let Some(e) = cause.downcast_ref::<sqlx::Error>() {
                return sqlx_is_transient(e);
            }
            if let Some(e) = cause.downcast_ref::<reqwest::Error>() {
                return e.is_timeout() || e.is_connect();
            }
            false
        })
    }
}

fn sqlx_is_transient(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => true,
        // SQLITE_BUSY (5) and SQLITE_LOCKED (6), including extended codes.
        sqlx::Error::Database(db) => db
            .code()
            .and_then(|code| code.parse::<i64>().ok())
            .map(|code| matches!(code & 0xff, 5 | 6))
            .unwrap_or(false),
        _ => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay: base_delay.saturating_mul(32),
        }
    }

    /// Never retries.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(5);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Runs `op` until it succeeds, fails permanently, or the policy's retry
/// budget is spent. The last error is returned unchanged.
pub async fn with_retry<T, E, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Transient + Display,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.max_retries && e.is_transient() => {
                attempt += 1;
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    operation = label,
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "transient failure, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
