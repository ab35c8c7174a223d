//! Retry policy type and executor.

use std::thread;
use std::time::{Duration, Instant};

use crate::error::ConfigError;

/// A retry policy: attempt an action up to `max_attempts` times, sleeping a
/// fixed `delay` after each failure.
///
/// Policies are immutable after construction and cheap to clone.
///
/// # Examples
///
/// ```rust
/// use resilience::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new(5, Duration::from_millis(200));
///
/// assert_eq!(policy.max_attempts(), 5);
/// assert_eq!(policy.delay(), Duration::from_millis(200));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

/// Information about a failed attempt, passed to retry hooks.
#[derive(Debug, Clone)]
pub struct RetryEvent<'a, E> {
    /// Which attempt just failed (1-indexed).
    pub attempt: u32,
    /// The error from the failed attempt.
    pub error: &'a E,
    /// True if another attempt follows the upcoming sleep.
    pub will_retry: bool,
    /// Total elapsed time since the first attempt started.
    pub elapsed: Duration,
}

impl RetryPolicy {
    /// Create a policy that tries at most `max_attempts` times with `delay`
    /// between attempts.
    ///
    /// # Panics
    ///
    /// Panics if `max_attempts` is zero. Use [`RetryPolicy::try_new`] to get
    /// an error instead.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        match Self::try_new(max_attempts, delay) {
            Ok(policy) => policy,
            Err(err) => panic!("invalid RetryPolicy: {}", err),
        }
    }

    /// Create a policy, rejecting a zero attempt count.
    ///
    /// ```rust
    /// use resilience::{ConfigError, RetryPolicy};
    /// use std::time::Duration;
    ///
    /// assert!(RetryPolicy::try_new(1, Duration::ZERO).is_ok());
    /// assert_eq!(
    ///     RetryPolicy::try_new(0, Duration::ZERO),
    ///     Err(ConfigError::ZeroMaxAttempts)
    /// );
    /// ```
    pub fn try_new(max_attempts: u32, delay: Duration) -> Result<Self, ConfigError> {
        let policy = Self {
            max_attempts,
            delay,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Maximum number of attempts, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Fixed delay slept after every failed attempt.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Check the policy's invariants.
    ///
    /// Only needed for policies that did not come through a constructor,
    /// e.g. ones deserialized from configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            Err(ConfigError::ZeroMaxAttempts)
        } else {
            Ok(())
        }
    }

    /// Run `action` under this policy.
    ///
    /// Returns the first success, or the error from the last attempt once
    /// `max_attempts` failures have been observed. The calling thread sleeps
    /// for `delay` after every failed attempt, the last one included.
    ///
    /// A policy that bypassed validation with `max_attempts == 0` still
    /// makes a single attempt.
    pub fn execute<T, E, F>(&self, action: F) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
    {
        self.execute_with_hooks(action, |_| {})
    }

    /// Like [`execute`](Self::execute), calling `on_failure` after every
    /// failed attempt and before the sleep that follows it.
    ///
    /// Useful for metrics or ad-hoc logging without enabling the `tracing`
    /// feature.
    ///
    /// ```rust
    /// use resilience::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::new(2, Duration::ZERO);
    /// let mut seen = Vec::new();
    ///
    /// let result: Result<(), _> = policy.execute_with_hooks(
    ///     || Err("down"),
    ///     |event| seen.push((event.attempt, event.will_retry)),
    /// );
    ///
    /// assert_eq!(result, Err("down"));
    /// assert_eq!(seen, vec![(1, true), (2, false)]);
    /// ```
    pub fn execute_with_hooks<T, E, F, H>(&self, mut action: F, mut on_failure: H) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
        H: FnMut(&RetryEvent<'_, E>),
    {
        let start = Instant::now();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let error = match action() {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            let will_retry = attempt < self.max_attempts;
            on_failure(&RetryEvent {
                attempt,
                error: &error,
                will_retry,
                elapsed: start.elapsed(),
            });

            #[cfg(feature = "tracing")]
            tracing::debug!(
                attempt,
                max_attempts = self.max_attempts,
                delay = ?self.delay,
                "attempt failed"
            );

            thread::sleep(self.delay);

            if !will_retry {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    attempts = attempt,
                    elapsed = ?start.elapsed(),
                    "retry attempts exhausted"
                );
                return Err(error);
            }
        }
    }
}
