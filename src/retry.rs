//! Retry/Timeout Executor
//!
//! Runs one asynchronous operation under a per-attempt deadline with a bounded
//! exponential-backoff retry loop. Attempts are strictly sequential. Whether a
//! failure is worth another attempt is decided by a pluggable predicate.

use crate::error::QueryError;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Decides whether a failed attempt may be retried
pub type RetryPredicate = Arc<dyn Fn(&QueryError) -> bool + Send + Sync>;

/// Observes each scheduled retry: (error, attempt that failed, delay before the next)
pub type RetryObserver = Arc<dyn Fn(&QueryError, u32, Duration) + Send + Sync>;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(8);

/// Retry configuration
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    is_retryable: RetryPredicate,
    on_retry: Option<RetryObserver>,
}

impl RetryPolicy {
    /// Policy with the default retryability predicate. `max_attempts` below 1 is
    /// raised to 1.
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
            is_retryable: Arc::new(is_retryable_error),
            on_retry: None,
        }
    }

    /// Exactly one attempt.
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    /// Replace the retryability predicate.
    pub fn with_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&QueryError) -> bool + Send + Sync + 'static,
    {
        self.is_retryable = Arc::new(predicate);
        self
    }

    /// Register a diagnostic observer called before each backoff sleep.
    pub fn with_on_retry<F>(mut self, observer: F) -> Self
    where
        F: Fn(&QueryError, u32, Duration) + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(observer));
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    pub fn is_retryable(&self, error: &QueryError) -> bool {
        (self.is_retryable)(error)
    }

    /// Backoff after the given 1-based failed attempt:
    /// `min(base_delay * 2^(attempt - 1), max_delay)`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(31);
        let multiplier = 1_u32 << shift;
        self.base_delay
            .checked_mul(multiplier)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY)
    }
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .field("on_retry", &self.on_retry.is_some())
            .finish()
    }
}

/// Default retryability: network failures, timeouts, 408, 429 and 5xx.
pub fn is_retryable_error(error: &QueryError) -> bool {
    match error {
        QueryError::Timeout(_) | QueryError::Network(_) => true,
        QueryError::Http { status, .. } => is_retryable_status(*status),
        _ => false,
    }
}

pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500..=599)
}

/// Run `operation` until it succeeds, the policy gives up, or a failure is not
/// retryable. `operation` receives the 1-based attempt number. An attempt still
/// pending after `timeout` is dropped and counts as a [`QueryError::Timeout`]
/// failure.
pub async fn run_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    timeout: Duration,
    mut operation: F,
) -> Result<T, QueryError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, QueryError>>,
{
    let mut attempt = 1;
    loop {
        let outcome = match tokio::time::timeout(timeout, operation(attempt)).await {
            Ok(result) => result,
            Err(_) => Err(QueryError::Timeout(timeout)),
        };

        let err = match outcome {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if attempt >= policy.max_attempts() || !policy.is_retryable(&err) {
            debug!(
                attempt,
                max_attempts = policy.max_attempts(),
                error = %err,
                "Giving up on request"
            );
            return Err(err);
        }

        let delay = policy.delay_for_attempt(attempt);
        if let Some(observer) = &policy.on_retry {
            observer(&err, attempt, delay);
        }
        warn!(
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "Request attempt failed, retrying"
        );
        if !delay.is_zero() {
            sleep(delay).await;
        }
        attempt += 1;
    }
}
