use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::core::{AppError, Result};

/// Bounded retry policy for transactional operations.
///
/// Only [`AppError::ConcurrencyConflict`] is retried; everything else is
/// returned to the caller on first sight. The whole operation starts over on
/// each attempt, so the closure must re-read whatever it locks.
///
/// `attempt_timeout` is enforced by [`RetryPolicy::within_deadline`], which
/// callers wrap around the locked read-plan-write of an attempt. Commit stays
/// outside the deadline: a commit that lands after the deadline would
/// otherwise be run a second time.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: Duration::from_millis(25),
            attempt_timeout: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff: Duration, attempt_timeout: Duration) -> Self {
        Self {
            max_retries,
            backoff,
            attempt_timeout,
        }
    }

    fn backoff_builder(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.backoff)
            .with_max_delay(self.backoff * 16)
            .with_max_times(self.max_retries as usize)
            .with_jitter()
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error, or
    /// the retry budget is spent.
    pub async fn run<T, F, Fut>(&self, operation_name: &str, operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let retries = AtomicU32::new(0);

        let outcome = operation
            .retry(self.backoff_builder())
            .when(AppError::is_retryable)
            .notify(|e: &AppError, delay: Duration| {
                let attempt = retries.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(
                    operation = operation_name,
                    attempt = attempt,
                    backoff_ms = %delay.as_millis(),
                    error = %e,
                    "Concurrency conflict, retrying from scratch"
                );
            })
            .await;

        let retries = retries.load(Ordering::Relaxed);
        match &outcome {
            Ok(_) if retries > 0 => info!(
                operation = operation_name,
                attempt = retries,
                "Operation succeeded after retry"
            ),
            Err(e) if e.is_retryable() => error!(
                operation = operation_name,
                retries = retries,
                error = %e,
                "Retry budget exhausted"
            ),
            _ => {}
        }

        outcome
    }

    /// Bound one attempt's work by `attempt_timeout`.
    ///
    /// A timed-out attempt is reported as a conflict so [`RetryPolicy::run`]
    /// starts it over. Dropping the unfinished future drops its unit of work,
    /// which rolls back.
    pub async fn within_deadline<T, Fut>(&self, operation_name: &str, work: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        match timeout(self.attempt_timeout, work).await {
            Ok(result) => result,
            Err(_) => Err(AppError::conflict(format!(
                "{} timed out after {}ms",
                operation_name,
                self.attempt_timeout.as_millis()
            ))),
        }
    }
}
