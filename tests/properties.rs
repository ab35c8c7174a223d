//! Property-based tests for retry counts and breaker thresholds.

use std::time::Duration;

use proptest::prelude::*;
use resilience::prelude::*;
use resilience::testing::{ScriptedAction, TestError};

const FAILED: TestError = TestError::Failure("failed");

proptest! {
    #[test]
    fn prop_retry_invokes_action_at_most_max_attempts(
        max_attempts in 1u32..8,
        failures in 0usize..10,
    ) {
        let policy = RetryPolicy::new(max_attempts, Duration::ZERO);
        let action = ScriptedAction::failing_times(failures, FAILED, ());

        let result = policy.execute(|| action.call());

        let expected_calls = (failures + 1).min(max_attempts as usize);
        prop_assert_eq!(action.calls(), expected_calls);
        prop_assert_eq!(result.is_ok(), failures < max_attempts as usize);
    }

    #[test]
    fn prop_breaker_opens_exactly_at_threshold(threshold in 1u32..10) {
        let breaker = CircuitBreakerPolicy::new(threshold, Duration::from_secs(60));
        let action = ScriptedAction::<(), _>::always(Err(FAILED));

        for _ in 1..threshold {
            let _ = breaker.execute(|| action.call());
            prop_assert_eq!(breaker.state(), CircuitState::Closed);
        }
        let _ = breaker.execute(|| action.call());
        prop_assert_eq!(breaker.state(), CircuitState::Open);

        let rejected = breaker.execute(|| action.call());
        prop_assert_eq!(rejected, Err(TestError::CircuitOpen));
        prop_assert_eq!(action.calls(), threshold as usize);
    }

    #[test]
    fn prop_success_always_resets_failure_count(
        threshold in 2u32..10,
        failures in 0u32..10,
    ) {
        let breaker = CircuitBreakerPolicy::new(threshold, Duration::from_secs(60));
        // Stay below the threshold so the success is not rejected.
        for _ in 0..failures.min(threshold - 1) {
            let _ = breaker.execute(|| Err::<(), _>(FAILED));
        }

        prop_assert_eq!(breaker.execute(|| Ok::<_, TestError>(())), Ok(()));
        prop_assert_eq!(breaker.failure_count(), 0);
    }

    #[test]
    fn prop_pipeline_call_budget(max_attempts in 1u32..6) {
        let pipeline = Resilience::new()
            .with_retry(RetryPolicy::new(max_attempts, Duration::ZERO))
            .with_circuit_breaker(CircuitBreakerPolicy::new(100, Duration::from_secs(60)))
            .with_fallback(FallbackPolicy::new(|| Ok::<_, TestError>(())));
        let action = ScriptedAction::always(Err(FAILED));

        prop_assert_eq!(pipeline.execute(|| action.call()), Ok(()));
        prop_assert_eq!(action.calls(), max_attempts as usize + 2);
    }
}
