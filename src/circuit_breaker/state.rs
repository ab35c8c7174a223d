//! Circuit states.

use std::fmt;

/// The state of a circuit breaker. Exactly one is active at any instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CircuitState {
    /// Normal operation; every call runs.
    #[default]
    Closed,
    /// Calls are rejected without running the action.
    Open,
    /// Probing after the recovery timeout; every call runs.
    HalfOpen,
}

impl CircuitState {
    /// Returns true if calls in this state are rejected up front.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half-open",
        };
        f.write_str(name)
    }
}
