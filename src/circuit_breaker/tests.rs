//! Behavioral tests for the circuit breaker.

use super::*;
use crate::error::BoxError;
use crate::{assert_circuit_open, assert_not_circuit_open};
use crate::testing::{CallCounter, OverlapTracker, ScriptedAction, TestError};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

const FAILED: TestError = TestError::Failure("failed");

fn fail() -> Result<(), TestError> {
    Err(FAILED)
}

fn succeed() -> Result<(), TestError> {
    Ok(())
}

#[test]
fn test_allows_requests_below_threshold() {
    let breaker = CircuitBreakerPolicy::new(3, Duration::from_secs(60));

    for _ in 0..2 {
        assert_eq!(breaker.execute(succeed), Ok(()));
    }

    assert_eq!(breaker.execute(fail), Err(FAILED));
    assert_eq!(breaker.state(), CircuitState::Closed);
    assert_eq!(breaker.failure_count(), 1);
}

#[test]
fn test_opens_after_threshold_and_skips_action() {
    let breaker = CircuitBreakerPolicy::new(3, Duration::from_secs(60));
    let action = ScriptedAction::<(), _>::always(Err(FAILED));

    for _ in 0..3 {
        assert_eq!(breaker.execute(|| action.call()), Err(FAILED));
    }
    assert_eq!(breaker.state(), CircuitState::Open);

    let result = breaker.execute(|| action.call());

    assert_circuit_open!(result);
    assert_eq!(action.calls(), 3);
}

#[test]
fn test_rejection_is_distinguishable_for_boxed_errors() {
    let breaker = CircuitBreakerPolicy::new(1, Duration::from_secs(60));

    let first = breaker.execute(|| Err::<(), BoxError>("refused".into()));
    assert_not_circuit_open!(first);

    let second = breaker.execute(|| Ok::<_, BoxError>(()));
    assert_circuit_open!(second);
}

#[test]
fn test_action_errors_pass_through_unchanged() {
    let breaker = CircuitBreakerPolicy::new(5, Duration::from_secs(60));
    let result = breaker.execute(|| Err::<u8, _>(TestError::Failure("disk full")));
    assert_eq!(result, Err(TestError::Failure("disk full")));
}

#[test]
fn test_success_resets_failure_count() {
    let breaker = CircuitBreakerPolicy::new(3, Duration::from_secs(60));

    let _ = breaker.execute(fail);
    let _ = breaker.execute(fail);
    assert_eq!(breaker.failure_count(), 2);

    assert_eq!(breaker.execute(succeed), Ok(()));
    assert_eq!(breaker.failure_count(), 0);

    // Two more failures are again below the threshold.
    let _ = breaker.execute(fail);
    let _ = breaker.execute(fail);
    assert_eq!(breaker.state(), CircuitState::Closed);
}

#[test]
fn test_returns_action_value() {
    let breaker = CircuitBreakerPolicy::new(3, Duration::from_secs(60));
    let result: Result<&str, TestError> = breaker.execute(|| Ok("payload"));
    assert_eq!(result, Ok("payload"));
}

#[test]
fn test_recovery_after_timeout_runs_one_trial_call() {
    let breaker = CircuitBreakerPolicy::new(3, Duration::from_millis(50));

    for _ in 0..3 {
        let _ = breaker.execute(fail);
    }
    assert_eq!(breaker.state(), CircuitState::Open);

    thread::sleep(Duration::from_millis(80));

    let counter = CallCounter::new();
    let result = breaker.execute(|| {
        counter.increment();
        succeed()
    });

    assert_eq!(result, Ok(()));
    assert_eq!(counter.get(), 1);
    assert_eq!(breaker.state(), CircuitState::HalfOpen);
    assert_eq!(breaker.failure_count(), 0);

    // Subsequent calls are no longer short-circuited.
    assert_eq!(breaker.execute(succeed), Ok(()));
    assert_ne!(breaker.state(), CircuitState::Open);
}

#[test]
fn test_half_open_closes_once_timeout_elapses_again() {
    let breaker = CircuitBreakerPolicy::new(1, Duration::from_millis(40));

    let _ = breaker.execute(fail);
    thread::sleep(Duration::from_millis(60));

    // The trial call succeeds; the last failure is now more than the timeout ago.
    assert_eq!(breaker.execute(succeed), Ok(()));
    assert_eq!(breaker.state(), CircuitState::HalfOpen);

    assert_eq!(breaker.execute(succeed), Ok(()));
    assert_eq!(breaker.state(), CircuitState::Closed);
}

#[test]
fn test_failed_trial_call_reopens_circuit() {
    let breaker = CircuitBreakerPolicy::new(2, Duration::from_millis(40));

    let _ = breaker.execute(fail);
    let _ = breaker.execute(fail);
    thread::sleep(Duration::from_millis(60));

    assert_eq!(breaker.execute(fail), Err(FAILED));
    assert_eq!(breaker.state(), CircuitState::Open);

    assert_circuit_open!(breaker.execute(succeed));
}

// After a successful trial call the last failure is already older than the
// timeout, so the next call closes the circuit before its action runs.
#[test]
fn test_failure_after_recovered_trial_call_counts_from_zero() {
    let breaker = CircuitBreakerPolicy::new(2, Duration::from_millis(40));

    let _ = breaker.execute(fail);
    let _ = breaker.execute(fail);
    thread::sleep(Duration::from_millis(60));

    assert_eq!(breaker.execute(succeed), Ok(()));
    assert_eq!(breaker.state(), CircuitState::HalfOpen);
    assert_eq!(breaker.failure_count(), 0);

    assert_eq!(breaker.execute(fail), Err(FAILED));
    assert_eq!(breaker.failure_count(), 1);
    assert_eq!(breaker.state(), CircuitState::Closed);
    assert_not_circuit_open!(breaker.execute(succeed));
}

#[test]
fn test_open_circuit_stays_open_until_timeout() {
    let breaker = CircuitBreakerPolicy::new(1, Duration::from_millis(200));
    let action = ScriptedAction::<(), TestError>::always(Ok(()));

    let _ = breaker.execute(fail);

    for _ in 0..5 {
        assert_circuit_open!(breaker.execute(|| action.call()));
    }
    assert_eq!(action.calls(), 0);
    // Rejections are not failures.
    assert_eq!(breaker.failure_count(), 1);
}

#[test]
fn test_concurrent_calls_never_overlap() {
    let breaker = Arc::new(CircuitBreakerPolicy::new(100, Duration::from_secs(60)));
    let tracker = OverlapTracker::new();
    let counter = CallCounter::new();
    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|i| {
            let breaker = Arc::clone(&breaker);
            let tracker = tracker.clone();
            let counter = counter.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                breaker.execute(|| {
                    let _guard = tracker.enter();
                    counter.increment();
                    thread::sleep(Duration::from_millis(10));
                    if i % 2 == 0 {
                        Ok(())
                    } else {
                        Err(FAILED)
                    }
                })
            })
        })
        .collect();

    for handle in handles {
        let _ = handle.join().unwrap();
    }

    assert_eq!(counter.get(), threads);
    assert_eq!(tracker.max_concurrent(), 1);
    assert!(!tracker.overlapped());
}

// Half-open admits every caller, not a single trial call. Each trial call still
// runs alone because the breaker lock serializes them.
#[test]
fn test_half_open_admits_every_concurrent_caller() {
    let breaker = Arc::new(CircuitBreakerPolicy::new(1, Duration::from_millis(40)));
    let _ = breaker.execute(fail);
    thread::sleep(Duration::from_millis(60));

    let counter = CallCounter::new();
    let threads = 4;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let breaker = Arc::clone(&breaker);
            let counter = counter.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                breaker.execute(|| {
                    counter.increment();
                    succeed()
                })
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), Ok(()));
    }

    assert_eq!(counter.get(), threads);
}

#[test]
fn test_panicking_action_does_not_wedge_breaker() {
    let breaker = Arc::new(CircuitBreakerPolicy::new(2, Duration::from_secs(60)));

    let panicked = {
        let breaker = Arc::clone(&breaker);
        thread::spawn(move || breaker.execute(|| -> Result<(), TestError> { panic!("boom") }))
            .join()
            .is_err()
    };

    assert!(panicked);
    assert_eq!(breaker.failure_count(), 0);
    assert_eq!(breaker.execute(succeed), Ok(()));
}

#[test]
fn test_breaker_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<CircuitBreakerPolicy>();
}

#[cfg(feature = "tracing")]
mod tracing_tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    #[traced_test]
    fn test_logs_state_transitions() {
        let breaker = CircuitBreakerPolicy::new(1, Duration::from_secs(60));
        let _ = breaker.execute(fail);
        let _ = breaker.execute(succeed);

        assert!(logs_contain("circuit state changed"));
        assert!(logs_contain("call rejected, circuit open"));
    }
}
