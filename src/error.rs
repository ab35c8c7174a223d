//! Error types shared by the policies.
//!
//! The toolkit manufactures exactly one runtime error of its own: the
//! [`CircuitOpen`] sentinel. Everything else an [`execute`] call returns is
//! whatever the caller's action produced, passed through untouched.
//!
//! [`execute`]: crate::CircuitBreakerPolicy::execute

use std::error::Error as StdError;
use std::fmt;

/// A type-erased, thread-safe error.
///
/// Convenient for actions that mix failure sources. `BoxError` already
/// implements `From<CircuitOpen>`, so it can flow through a circuit breaker
/// without any extra glue.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Sentinel returned when a circuit breaker rejects a call without running it.
///
/// This is the only error the breaker produces itself. Its presence means
/// "rejected without trying", as opposed to "tried and failed".
///
/// # Examples
///
/// ```rust
/// use resilience::{CircuitBreakerPolicy, CircuitOpen};
/// use std::time::Duration;
///
/// #[derive(Debug, PartialEq)]
/// enum FetchError {
///     Unavailable,
///     Rejected(CircuitOpen),
/// }
///
/// impl From<CircuitOpen> for FetchError {
///     fn from(open: CircuitOpen) -> Self {
///         FetchError::Rejected(open)
///     }
/// }
///
/// let breaker = CircuitBreakerPolicy::new(1, Duration::from_secs(60));
///
/// let first = breaker.execute(|| Err::<(), _>(FetchError::Unavailable));
/// assert_eq!(first, Err(FetchError::Unavailable));
///
/// let second = breaker.execute(|| Ok::<_, FetchError>(()));
/// assert_eq!(second, Err(FetchError::Rejected(CircuitOpen)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CircuitOpen;

impl fmt::Display for CircuitOpen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("circuit breaker is open")
    }
}

impl StdError for CircuitOpen {}

/// Returns true if `err` is, or is caused by, the [`CircuitOpen`] sentinel.
///
/// Walks the `source()` chain, so the check still works when a caller wraps
/// the sentinel inside its own error type.
///
/// # Examples
///
/// ```rust
/// use resilience::{is_circuit_open, BoxError, CircuitOpen};
///
/// let rejected: BoxError = CircuitOpen.into();
/// assert!(is_circuit_open(&*rejected));
///
/// let failed: BoxError = "connection reset".into();
/// assert!(!is_circuit_open(&*failed));
/// ```
pub fn is_circuit_open(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.is::<CircuitOpen>() {
            return true;
        }
        current = e.source();
    }
    false
}

/// Invalid construction parameters for a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A retry policy must attempt the action at least once.
    ZeroMaxAttempts,
    /// A circuit breaker needs a failure threshold of at least one.
    ZeroFailureThreshold,
    /// A circuit breaker needs a non-zero recovery timeout.
    ZeroRecoveryTimeout,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroMaxAttempts => write!(f, "max_attempts must be at least 1"),
            Self::ZeroFailureThreshold => write!(f, "failure_threshold must be at least 1"),
            Self::ZeroRecoveryTimeout => write!(f, "recovery_timeout must be greater than zero"),
        }
    }
}

impl StdError for ConfigError {}
