// Unit tests for the retry/backoff executor.
//
// All timing tests run under tokio's paused clock (test-util), so sleeps and
// timeouts advance deterministically and the asserted delays are exact.

use crate::error::ClassifiedError;
use crate::retry::{execute_with_retry, RetryPolicy};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

fn counted() -> (Arc<AtomicU32>, impl Fn() -> u32) {
    let counter = Arc::new(AtomicU32::new(0));
    let reader = {
        let counter = Arc::clone(&counter);
        move || counter.load(Ordering::SeqCst)
    };
    (counter, reader)
}

#[tokio::test(start_paused = true)]
async fn retryable_failures_are_retried_until_success() {
    let (counter, calls) = counted();
    let started = Instant::now();

    let observed_delays = Arc::new(Mutex::new(Vec::new()));
    let mut policy = RetryPolicy::default();
    policy.on_retry = Some(Arc::new({
        let observed = Arc::clone(&observed_delays);
        move |_error, _attempt, delay| observed.lock().unwrap().push(delay)
    }));

    let result = execute_with_retry(&policy, || {
        let counter = Arc::clone(&counter);
        async move {
            let attempt = counter.fetch_add(1, Ordering::SeqCst);
            if attempt < 3 {
                Err(ClassifiedError::model_unavailable())
            } else {
                Ok("answer")
            }
        }
    })
    .await;

    assert_eq!(result.unwrap(), "answer");
    assert_eq!(calls(), 4, "initial attempt plus three retries");
    assert_eq!(
        *observed_delays.lock().unwrap(),
        vec![
            Duration::from_millis(1000),
            Duration::from_millis(2000),
            Duration::from_millis(4000)
        ]
    );
    // 1s + 2s + 4s of backoff, attempts themselves are instant.
    assert_eq!(started.elapsed(), Duration::from_secs(7));
}

#[tokio::test(start_paused = true)]
async fn non_retryable_failure_returns_after_one_attempt() {
    let (counter, calls) = counted();
    let policy = RetryPolicy::default();

    let result: Result<(), _> = execute_with_retry(&policy, || {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(ClassifiedError::content_filtered())
        }
    })
    .await;

    let error = result.unwrap_err();
    assert_eq!(error.code().as_str(), "E-5003");
    assert_eq!(calls(), 1, "hard gate: no retries for non-retryable errors");
}

#[tokio::test(start_paused = true)]
async fn exhaustion_returns_the_last_error() {
    let (counter, calls) = counted();
    let policy = RetryPolicy::default();

    let result: Result<(), _> = execute_with_retry(&policy, || {
        let counter = Arc::clone(&counter);
        async move {
            let attempt = counter.fetch_add(1, Ordering::SeqCst);
            Err(ClassifiedError::model_unavailable().with_message(format!("failure {}", attempt + 1)))
        }
    })
    .await;

    let error = result.unwrap_err();
    assert_eq!(calls(), 4);
    assert_eq!(error.message(), "failure 4", "last error, not the first");
}

#[tokio::test(start_paused = true)]
async fn per_attempt_timeout_becomes_a_retryable_model_timeout() {
    let (counter, calls) = counted();
    let policy = RetryPolicy::default();
    let started = Instant::now();

    let result: Result<(), _> = execute_with_retry(&policy, || {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            futures_util::future::pending::<()>().await;
            unreachable!("pending future resolved")
        }
    })
    .await;

    let error = result.unwrap_err();
    assert_eq!(error.code().as_str(), "E-5001");
    assert!(error.retryable());
    assert_eq!(calls(), 4);
    // Four 5s attempt deadlines plus 1s+2s+4s backoff.
    assert_eq!(started.elapsed(), Duration::from_secs(27));
}

#[tokio::test(start_paused = true)]
async fn success_short_circuits_without_delay() {
    let (counter, calls) = counted();
    let policy = RetryPolicy::default();
    let started = Instant::now();

    let result = execute_with_retry(&policy, || {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(42)
        }
    })
    .await;

    assert_eq!(result.unwrap(), 42);
    assert_eq!(calls(), 1);
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn zero_retry_budget_fails_on_first_error() {
    let (counter, calls) = counted();
    let policy = RetryPolicy {
        max_retries: 0,
        ..RetryPolicy::default()
    };

    let result: Result<(), _> = execute_with_retry(&policy, || {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(ClassifiedError::model_unavailable())
        }
    })
    .await;

    assert!(result.is_err());
    assert_eq!(calls(), 1);
}

#[test]
fn backoff_delays_grow_exponentially() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.backoff_delay(0), Duration::from_millis(1000));
    assert_eq!(policy.backoff_delay(1), Duration::from_millis(2000));
    assert_eq!(policy.backoff_delay(2), Duration::from_millis(4000));
}

#[test]
fn default_predicate_gates_on_external_layer_and_flag() {
    let policy = RetryPolicy::default();
    assert!((policy.is_retryable)(&ClassifiedError::model_rate_limited()));
    // Retryable as a deliberate defensive default for transient bad output.
    assert!((policy.is_retryable)(&ClassifiedError::invalid_model_response("garbled")));
    assert!(!(policy.is_retryable)(&ClassifiedError::content_filtered()));
    // Retryable flag alone is not enough: the default policy only covers the
    // external model layer.
    assert!(!(policy.is_retryable)(&ClassifiedError::deadlock_detected()));
}
