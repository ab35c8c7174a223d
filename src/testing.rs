//! Testing utilities for code that wraps actions in resilience policies.
//!
//! This module provides scripted actions with invocation counters, a tracker for
//! detecting overlapping executions, assertion macros for circuit-open
//! rejections, and (with the `proptest` feature) `Arbitrary` impls for the
//! policy configuration types.
//!
//! # Examples
//!
//! ## Scripted actions
//!
//! ```rust
//! use resilience::testing::ScriptedAction;
//!
//! // Fails twice, then succeeds forever after.
//! let action = ScriptedAction::new(vec![Err("busy"), Err("busy"), Ok(7)]);
//!
//! assert_eq!(action.call(), Err("busy"));
//! assert_eq!(action.call(), Err("busy"));
//! assert_eq!(action.call(), Ok(7));
//! assert_eq!(action.call(), Ok(7));
//! assert_eq!(action.calls(), 4);
//! ```
//!
//! ## Assertion macros
//!
//! ```rust
//! use resilience::{assert_circuit_open, assert_not_circuit_open, CircuitOpen};
//! use resilience::testing::TestError;
//!
//! let rejected: Result<(), TestError> = Err(CircuitOpen.into());
//! assert_circuit_open!(rejected);
//!
//! let failed: Result<(), TestError> = Err(TestError::Failure("timeout"));
//! assert_not_circuit_open!(failed);
//! ```

use std::error::Error as StdError;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::{is_circuit_open, BoxError, CircuitOpen};

/// A cloneable, thread-safe invocation counter.
///
/// Clones share the same count, so a counter can be moved into an action
/// closure while the test keeps a handle for assertions.
///
/// # Example
///
/// ```rust
/// use resilience::testing::CallCounter;
///
/// let counter = CallCounter::new();
/// let action = {
///     let counter = counter.clone();
///     move || {
///         counter.increment();
///         Ok::<_, ()>(())
///     }
/// };
///
/// action().unwrap();
/// action().unwrap();
/// assert_eq!(counter.get(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CallCounter {
    count: Arc<AtomicUsize>,
}

impl CallCounter {
    /// Create a counter starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one invocation and return the new total.
    pub fn increment(&self) -> usize {
        self.count.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Current number of recorded invocations.
    pub fn get(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

/// An action that plays back a fixed script of outcomes.
///
/// Each call returns the next scripted outcome. Once the script runs out the
/// last outcome repeats indefinitely. Safe to share across threads.
#[derive(Debug, Clone)]
pub struct ScriptedAction<T, E> {
    script: Arc<Vec<Result<T, E>>>,
    counter: CallCounter,
}

impl<T: Clone, E: Clone> ScriptedAction<T, E> {
    /// Create an action from a script of outcomes.
    ///
    /// # Panics
    ///
    /// Panics if the script is empty.
    pub fn new(script: impl IntoIterator<Item = Result<T, E>>) -> Self {
        let script: Vec<_> = script.into_iter().collect();
        assert!(!script.is_empty(), "ScriptedAction needs at least one outcome");
        Self {
            script: Arc::new(script),
            counter: CallCounter::new(),
        }
    }

    /// An action that always returns `outcome`.
    pub fn always(outcome: Result<T, E>) -> Self {
        Self::new([outcome])
    }

    /// An action that fails with `error` for the first `failures` calls and
    /// returns `value` from then on.
    pub fn failing_times(failures: usize, error: E, value: T) -> Self {
        Self::new(
            std::iter::repeat_n(Err(error), failures).chain(std::iter::once(Ok(value))),
        )
    }

    /// Invoke the action, returning the next scripted outcome.
    pub fn call(&self) -> Result<T, E> {
        let index = self.counter.increment() - 1;
        let last = self.script.len() - 1;
        self.script[index.min(last)].clone()
    }

    /// Number of times the action has been invoked, across all clones.
    pub fn calls(&self) -> usize {
        self.counter.get()
    }
}

/// Detects whether protected calls ever ran at the same time.
///
/// Call [`enter`](OverlapTracker::enter) at the start of an action and hold the
/// returned guard until the action finishes.
///
/// ```rust
/// use resilience::testing::OverlapTracker;
///
/// let tracker = OverlapTracker::new();
/// {
///     let _guard = tracker.enter();
///     assert_eq!(tracker.active(), 1);
/// }
/// assert_eq!(tracker.active(), 0);
/// assert_eq!(tracker.max_concurrent(), 1);
/// assert!(!tracker.overlapped());
/// ```
#[derive(Debug, Clone, Default)]
pub struct OverlapTracker {
    active: Arc<AtomicUsize>,
    max: Arc<AtomicUsize>,
}

/// Guard returned by [`OverlapTracker::enter`]; leaves the tracker on drop.
#[derive(Debug)]
pub struct OverlapGuard {
    active: Arc<AtomicUsize>,
}

impl OverlapTracker {
    /// Create a tracker with no active calls.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a call as running until the guard is dropped.
    pub fn enter(&self) -> OverlapGuard {
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max.fetch_max(now_active, Ordering::SeqCst);
        OverlapGuard {
            active: Arc::clone(&self.active),
        }
    }

    /// Calls currently inside the tracker.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneous calls seen.
    pub fn max_concurrent(&self) -> usize {
        self.max.load(Ordering::SeqCst)
    }

    /// True if two calls were ever inside the tracker at once.
    pub fn overlapped(&self) -> bool {
        self.max_concurrent() > 1
    }
}

impl Drop for OverlapGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A small error type for exercising policies in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestError {
    /// The action ran and failed.
    Failure(&'static str),
    /// The circuit breaker rejected the call.
    CircuitOpen,
}

impl fmt::Display for TestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failure(msg) => write!(f, "action failed: {}", msg),
            Self::CircuitOpen => fmt::Display::fmt(&CircuitOpen, f),
        }
    }
}

impl StdError for TestError {}

impl From<CircuitOpen> for TestError {
    fn from(_: CircuitOpen) -> Self {
        TestError::CircuitOpen
    }
}

/// Errors that can report whether they are a circuit-open rejection.
///
/// Used by [`assert_circuit_open!`](crate::assert_circuit_open) and
/// [`assert_not_circuit_open!`](crate::assert_not_circuit_open). Implement it
/// for your own error type to use those macros with it.
pub trait CircuitRejection {
    /// True if this error is the breaker's rejection sentinel.
    fn is_circuit_rejection(&self) -> bool;
}

impl CircuitRejection for CircuitOpen {
    fn is_circuit_rejection(&self) -> bool {
        true
    }
}

impl CircuitRejection for TestError {
    fn is_circuit_rejection(&self) -> bool {
        matches!(self, TestError::CircuitOpen)
    }
}

impl CircuitRejection for BoxError {
    fn is_circuit_rejection(&self) -> bool {
        is_circuit_open(&**self)
    }
}

/// Assert that a result is a circuit-open rejection.
///
/// The error type must implement
/// [`CircuitRejection`](crate::testing::CircuitRejection).
///
/// # Example
///
/// ```rust
/// use resilience::{assert_circuit_open, BoxError, CircuitOpen};
///
/// let result: Result<u8, BoxError> = Err(CircuitOpen.into());
/// assert_circuit_open!(result);
/// ```
#[macro_export]
macro_rules! assert_circuit_open {
    ($result:expr) => {
        match $result {
            Err(ref err) if $crate::testing::CircuitRejection::is_circuit_rejection(err) => {}
            Err(err) => {
                panic!("Expected circuit-open rejection, got error: {:?}", err);
            }
            Ok(v) => {
                panic!("Expected circuit-open rejection, got Ok: {:?}", v);
            }
        }
    };
}

/// Assert that a result is anything other than a circuit-open rejection.
///
/// # Example
///
/// ```rust
/// use resilience::{assert_not_circuit_open, BoxError};
///
/// let result: Result<u8, BoxError> = Err("refused".into());
/// assert_not_circuit_open!(result);
/// ```
#[macro_export]
macro_rules! assert_not_circuit_open {
    ($result:expr) => {
        if let Err(ref err) = $result {
            if $crate::testing::CircuitRejection::is_circuit_rejection(err) {
                panic!("Expected the action to run, but the circuit was open");
            }
        }
    };
}

#[cfg(feature = "proptest")]
mod arbitrary {
    use std::time::Duration;

    use proptest::prelude::*;

    use crate::config::CircuitBreakerConfig;
    use crate::retry::RetryPolicy;

    impl Arbitrary for RetryPolicy {
        type Parameters = ();
        type Strategy = BoxedStrategy<Self>;

        fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
            (1u32..=10, 0u64..=5)
                .prop_map(|(attempts, millis)| {
                    RetryPolicy::new(attempts, Duration::from_millis(millis))
                })
                .boxed()
        }
    }

    impl Arbitrary for CircuitBreakerConfig {
        type Parameters = ();
        type Strategy = BoxedStrategy<Self>;

        fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
            (1u32..=10, 1u64..=1_000)
                .prop_map(|(threshold, millis)| {
                    CircuitBreakerConfig::new(threshold, Duration::from_millis(millis))
                })
                .boxed()
        }
    }
}
