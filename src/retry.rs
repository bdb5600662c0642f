//! Retry logic with exponential backoff and per-attempt timeouts.
//!
//! [`execute_with_retry`] drives an async operation under a [`RetryPolicy`]:
//! each attempt runs under `per_attempt_timeout` (a timeout manifests as a
//! retryable model-timeout error), failures are retried with delays of
//! `initial_delay * backoff_factor^attempt` while the policy's predicate
//! allows it, and the last error is returned unchanged once the budget is
//! exhausted. Retryability is a hard gate: a non-retryable error returns
//! immediately regardless of remaining attempts.
//!
//! Backoff sleeps use `tokio::time::sleep`, so waiting yields the executor
//! and never blocks unrelated work. The per-attempt timeout cancels a single
//! attempt, not the sequence; callers needing an overall deadline must bound
//! it externally (worst case `per_attempt_timeout * (max_retries + 1)` plus
//! the sum of delays).

use crate::config::PipelineConfig;
use crate::error::{ClassifiedError, PipelineResult};
use crate::logging::{log_debug, log_warn};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Decides whether a failed attempt may be re-run.
pub type RetryPredicate = Arc<dyn Fn(&ClassifiedError) -> bool + Send + Sync>;

/// Invoked before each backoff sleep with `(error, attempt, delay)`, where
/// `attempt` is the 1-based number of the attempt that just failed.
pub type RetryObserver = Arc<dyn Fn(&ClassifiedError, u32, Duration) + Send + Sync>;

/// Default retry budget: 3 retries after the initial attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default initial backoff delay.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(1000);
/// Default exponential backoff factor (delays 1s, 2s, 4s).
pub const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;

/// Retry policy configuration. Stateless: one instance may be shared across
/// calls and is never mutated during execution.
#[derive(Clone)]
pub struct RetryPolicy {
    /// Maximum number of retries after the initial attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Multiplier applied per attempt for exponential backoff.
    pub backoff_factor: f64,
    /// Deadline for each individual attempt.
    pub per_attempt_timeout: Duration,
    /// Predicate deciding whether a failure may be retried.
    pub is_retryable: RetryPredicate,
    /// Optional hook for logging or metrics on each retry.
    pub on_retry: Option<RetryObserver>,
}

impl Default for RetryPolicy {
    /// The default policy used for external model calls: 3 retries, delays
    /// 1s/2s/4s, 5s per-attempt timeout, retrying only external-model-layer
    /// failures flagged retryable.
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: DEFAULT_INITIAL_DELAY,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            per_attempt_timeout: PipelineConfig::default().model_timeout,
            is_retryable: Arc::new(|error| {
                matches!(error, ClassifiedError::External(_)) && error.retryable()
            }),
            on_retry: Some(Arc::new(|error, attempt, delay| {
                log_warn!(
                    attempt = attempt,
                    delay_ms = delay.as_millis() as u64,
                    code = %error.code(),
                    error = %error,
                    "retrying after failure"
                );
            })),
        }
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .field("initial_delay", &self.initial_delay)
            .field("backoff_factor", &self.backoff_factor)
            .field("per_attempt_timeout", &self.per_attempt_timeout)
            .finish_non_exhaustive()
    }
}

impl RetryPolicy {
    /// Default policy with the per-attempt timeout taken from configuration
    /// (read once at initialization, not hot-reloaded).
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            per_attempt_timeout: config.model_timeout,
            ..Self::default()
        }
    }

    /// Backoff delay preceding the retry after a failed 0-based `attempt`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.initial_delay
            .mul_f64(self.backoff_factor.powi(attempt as i32))
    }
}

/// Run `operation` under `policy`, returning its first success or the last
/// classified error once retries are exhausted.
///
/// The operation is wrapped with the per-attempt timeout here, not by the
/// caller. Exactly one of success or terminal error is produced per call;
/// attempt state lives only for the duration of this call.
pub async fn execute_with_retry<F, Fut, T>(policy: &RetryPolicy, operation: F) -> PipelineResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = PipelineResult<T>>,
{
    let mut attempt: u32 = 0;
    loop {
        log_debug!(
            attempt = attempt,
            max_retries = policy.max_retries,
            "executing attempt"
        );

        let error = match tokio::time::timeout(policy.per_attempt_timeout, operation()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(error)) => error,
            Err(_elapsed) => ClassifiedError::model_timeout(policy.per_attempt_timeout),
        };

        if attempt >= policy.max_retries {
            log_debug!(
                attempt = attempt,
                code = %error.code(),
                "retry budget exhausted"
            );
            return Err(error);
        }
        // Hard gate: remaining budget is irrelevant for non-retryable failures.
        if !(policy.is_retryable)(&error) {
            return Err(error);
        }

        let delay = policy.backoff_delay(attempt);
        if let Some(on_retry) = &policy.on_retry {
            on_retry(&error, attempt + 1, delay);
        }
        sleep(delay).await;
        attempt += 1;
    }
}
