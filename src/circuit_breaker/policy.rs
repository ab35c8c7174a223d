//! Circuit breaker policy and its guarded state machine.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use super::state::CircuitState;
use crate::config::CircuitBreakerConfig;
use crate::error::{CircuitOpen, ConfigError};

/// A circuit breaker guarding one protected resource.
///
/// The breaker counts consecutive failures. Once `failure_threshold` is
/// reached the circuit opens and calls are rejected with [`CircuitOpen`]
/// until more than `recovery_timeout` has passed since the last failure.
///
/// All state lives behind a single mutex that is held for the whole of
/// [`execute`](Self::execute): the state check, the action itself and the
/// state update. Callers sharing one breaker therefore never run their
/// actions through it concurrently.
///
/// Create one breaker per protected resource and share it, typically as an
/// `Arc<CircuitBreakerPolicy>`.
///
/// # Examples
///
/// ```rust
/// use resilience::{BoxError, CircuitBreakerPolicy, CircuitState, is_circuit_open};
/// use std::time::Duration;
///
/// let breaker = CircuitBreakerPolicy::new(2, Duration::from_secs(30));
///
/// for _ in 0..2 {
///     let _ = breaker.execute(|| Err::<(), BoxError>("refused".into()));
/// }
/// assert_eq!(breaker.state(), CircuitState::Open);
///
/// let rejected = breaker.execute(|| Ok::<_, BoxError>(()));
/// assert!(is_circuit_open(&*rejected.unwrap_err()));
/// ```
#[derive(Debug)]
pub struct CircuitBreakerPolicy {
    failure_threshold: u32,
    recovery_timeout: Duration,
    inner: Mutex<BreakerState>,
}

#[derive(Debug, Default)]
struct BreakerState {
    state: CircuitState,
    failure_count: u32,
    last_failure: Option<Instant>,
}

impl BreakerState {
    /// True if more than `timeout` has passed since the last failure.
    ///
    /// A breaker that has never failed counts as fully recovered.
    fn recovered(&self, now: Instant, timeout: Duration) -> bool {
        match self.last_failure {
            Some(at) => now.saturating_duration_since(at) > timeout,
            None => true,
        }
    }

    /// Decide whether a call may proceed, applying any time-based transition.
    fn admit(&mut self, now: Instant, timeout: Duration) -> Result<(), CircuitOpen> {
        match self.state {
            CircuitState::Closed => Ok(()),
            CircuitState::Open => {
                if self.recovered(now, timeout) {
                    self.transition(CircuitState::HalfOpen);
                    Ok(())
                } else {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(failure_count = self.failure_count, "call rejected, circuit open");
                    Err(CircuitOpen)
                }
            }
            CircuitState::HalfOpen => {
                if self.recovered(now, timeout) {
                    self.transition(CircuitState::Closed);
                }
                Ok(())
            }
        }
    }

    fn record_failure(&mut self, now: Instant, threshold: u32) {
        self.failure_count = self.failure_count.saturating_add(1);
        if self.failure_count >= threshold && !self.state.is_open() {
            self.transition(CircuitState::Open);
        }
        self.last_failure = Some(now);
    }

    fn record_success(&mut self) {
        self.failure_count = 0;
    }

    fn transition(&mut self, to: CircuitState) {
        #[cfg(feature = "tracing")]
        tracing::info!(
            from = %self.state,
            to = %to,
            failure_count = self.failure_count,
            "circuit state changed"
        );
        self.state = to;
    }
}

impl CircuitBreakerPolicy {
    /// Create a closed breaker.
    ///
    /// # Panics
    ///
    /// Panics if `failure_threshold` is zero or `recovery_timeout` is zero.
    /// Use [`CircuitBreakerPolicy::try_new`] to get an error instead.
    pub fn new(failure_threshold: u32, recovery_timeout: Duration) -> Self {
        match Self::try_new(failure_threshold, recovery_timeout) {
            Ok(breaker) => breaker,
            Err(err) => panic!("invalid CircuitBreakerPolicy: {}", err),
        }
    }

    /// Create a closed breaker, rejecting non-positive parameters.
    ///
    /// ```rust
    /// use resilience::{CircuitBreakerPolicy, ConfigError};
    /// use std::time::Duration;
    ///
    /// let err = CircuitBreakerPolicy::try_new(0, Duration::from_secs(1)).unwrap_err();
    /// assert_eq!(err, ConfigError::ZeroFailureThreshold);
    /// ```
    pub fn try_new(failure_threshold: u32, recovery_timeout: Duration) -> Result<Self, ConfigError> {
        CircuitBreakerConfig::new(failure_threshold, recovery_timeout).validate()?;
        Ok(Self {
            failure_threshold,
            recovery_timeout,
            inner: Mutex::new(BreakerState::default()),
        })
    }

    /// Create a closed breaker from configuration data.
    pub fn from_config(config: &CircuitBreakerConfig) -> Result<Self, ConfigError> {
        config.build()
    }

    /// The parameters this breaker was built with.
    pub fn config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig::new(self.failure_threshold, self.recovery_timeout)
    }

    /// Consecutive failures that open the circuit.
    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }

    /// How long the circuit stays open after the most recent failure.
    pub fn recovery_timeout(&self) -> Duration {
        self.recovery_timeout
    }

    /// Snapshot of the current state.
    ///
    /// Takes the breaker lock, so it waits for any in-flight
    /// [`execute`](Self::execute) to finish. The value may be stale as soon
    /// as it is returned.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Snapshot of the consecutive failure count.
    pub fn failure_count(&self) -> u32 {
        self.lock().failure_count
    }

    /// Run `action` through the breaker.
    ///
    /// While the circuit is open and the recovery timeout has not elapsed
    /// the action is not invoked and `E::from(CircuitOpen)` is returned.
    /// Otherwise the action runs and its result is returned unchanged, after
    /// updating the failure count and state.
    ///
    /// The half-open state does not limit probing: every caller that reaches
    /// the breaker while it is half-open runs its action (one at a time, as
    /// the lock serializes them).
    pub fn execute<T, E, F>(&self, action: F) -> Result<T, E>
    where
        E: From<CircuitOpen>,
        F: FnOnce() -> Result<T, E>,
    {
        self.execute_with(E::from, action)
    }

    /// Like [`execute`](Self::execute), but a rejection is turned into `E`
    /// by `on_open` instead of a `From` impl.
    ///
    /// Useful when `E` cannot implement `From<CircuitOpen>`, such as a
    /// foreign error type or `&'static str`.
    ///
    /// ```rust
    /// use resilience::CircuitBreakerPolicy;
    /// use std::time::Duration;
    ///
    /// let breaker = CircuitBreakerPolicy::new(1, Duration::from_secs(30));
    /// let _ = breaker.execute_with(|_| "open", || Err::<(), _>("down"));
    ///
    /// assert_eq!(breaker.execute_with(|_| "open", || Ok(())), Err("open"));
    /// ```
    pub fn execute_with<T, E, O, F>(&self, on_open: O, action: F) -> Result<T, E>
    where
        O: FnOnce(CircuitOpen) -> E,
        F: FnOnce() -> Result<T, E>,
    {
        let mut inner = self.lock();
        inner.admit(Instant::now(), self.recovery_timeout).map_err(on_open)?;

        let result = action();
        match &result {
            Ok(_) => inner.record_success(),
            Err(_) => inner.record_failure(Instant::now(), self.failure_threshold),
        }
        result
    }

    // An action that panicked poisoned the lock before any update ran, so
    // the state behind it is still consistent.
    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
