//! Plain-data configuration for policies.
//!
//! A [`CircuitBreakerPolicy`] owns a lock and live state, so it cannot be
//! serialized itself. [`CircuitBreakerConfig`] carries just its construction
//! parameters. [`ResilienceConfig`] bundles the data-only stages of a
//! pipeline; the fallback stage is code and is attached afterwards with
//! [`Resilience::with_fallback`](crate::Resilience::with_fallback).
//!
//! With the `serde` feature enabled these types implement `Serialize` and
//! `Deserialize`, so a pipeline can be described in a config file:
//!
//! ```rust
//! # #[cfg(feature = "serde")]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use resilience::{Resilience, ResilienceConfig};
//!
//! let json = r#"{
//!     "retry": { "max_attempts": 3, "delay": { "secs": 0, "nanos": 200000000 } },
//!     "circuit_breaker": { "failure_threshold": 5, "recovery_timeout": { "secs": 30, "nanos": 0 } }
//! }"#;
//!
//! let config: ResilienceConfig = serde_json::from_str(json)?;
//! let pipeline = Resilience::<(), resilience::BoxError>::from_config(&config)?;
//! assert_eq!(pipeline.retry().map(|r| r.max_attempts()), Some(3));
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "serde"))]
//! # fn main() {}
//! ```

use std::time::Duration;

use crate::circuit_breaker::CircuitBreakerPolicy;
use crate::error::ConfigError;
use crate::retry::RetryPolicy;

/// Construction parameters for a [`CircuitBreakerPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit.
    pub failure_threshold: u32,
    /// How long the circuit stays open after the most recent failure.
    pub recovery_timeout: Duration,
}

impl CircuitBreakerConfig {
    /// Bundle breaker parameters without validating them.
    pub fn new(failure_threshold: u32, recovery_timeout: Duration) -> Self {
        Self {
            failure_threshold,
            recovery_timeout,
        }
    }

    /// Check that both parameters are positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.failure_threshold == 0 {
            return Err(ConfigError::ZeroFailureThreshold);
        }
        if self.recovery_timeout.is_zero() {
            return Err(ConfigError::ZeroRecoveryTimeout);
        }
        Ok(())
    }

    /// Build a fresh breaker in the closed state.
    pub fn build(&self) -> Result<CircuitBreakerPolicy, ConfigError> {
        CircuitBreakerPolicy::try_new(self.failure_threshold, self.recovery_timeout)
    }
}

/// The data-only stages of a [`Resilience`](crate::Resilience) pipeline.
///
/// Absent sections mean "skip this stage".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResilienceConfig {
    /// Retry stage parameters.
    #[cfg_attr(feature = "serde", serde(default))]
    pub retry: Option<RetryPolicy>,
    /// Circuit breaker stage parameters.
    #[cfg_attr(feature = "serde", serde(default))]
    pub circuit_breaker: Option<CircuitBreakerConfig>,
}

impl ResilienceConfig {
    /// Validate every present section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(retry) = &self.retry {
            retry.validate()?;
        }
        if let Some(breaker) = &self.circuit_breaker {
            breaker.validate()?;
        }
        Ok(())
    }
}
