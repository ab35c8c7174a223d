//! The resilience pipeline.
//!
//! [`Resilience`] chains an optional retry stage, an optional circuit breaker
//! stage and an optional fallback stage in that fixed order.
//!
//! Each stage invokes the caller's **original** action, not the output of the
//! stage before it:
//!
//! 1. Retry (or a single direct call when no retry policy is set).
//! 2. If that failed and a breaker is set: one fresh call through the breaker.
//! 3. If that still failed and a fallback is set: the fallback policy runs the
//!    original action once more and, if it fails again, the fallback action.
//!
//! A single [`execute`](Resilience::execute) can therefore invoke the action
//! up to `max_attempts + 2` times. Actions must tolerate being repeated.
//!
//! # Example
//!
//! ```rust
//! use resilience::{
//!     BoxError, CircuitBreakerPolicy, FallbackPolicy, Resilience, RetryPolicy,
//! };
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let breaker = Arc::new(CircuitBreakerPolicy::new(2, Duration::from_secs(5)));
//!
//! let pipeline = Resilience::new()
//!     .with_retry(RetryPolicy::new(3, Duration::from_millis(1)))
//!     .with_circuit_breaker(breaker)
//!     .with_fallback(FallbackPolicy::new(|| Ok::<_, BoxError>("from cache")));
//!
//! let result = pipeline.execute(|| Err("main action failed".into()));
//! assert_eq!(result.unwrap(), "from cache");
//! ```

use std::fmt;
use std::sync::Arc;

use crate::circuit_breaker::CircuitBreakerPolicy;
use crate::config::ResilienceConfig;
use crate::error::{CircuitOpen, ConfigError};
use crate::fallback::FallbackPolicy;
use crate::retry::RetryPolicy;

/// A fixed-order pipeline of optional retry, circuit breaker and fallback
/// stages.
///
/// Configure it with the `with_*` builder methods, then share it (it is
/// `Send + Sync`) and call [`execute`](Self::execute) from any thread. Only
/// the circuit breaker holds mutable state, and it synchronizes itself.
pub struct Resilience<T, E> {
    retry: Option<RetryPolicy>,
    circuit_breaker: Option<BreakerStage<E>>,
    fallback: Option<FallbackPolicy<T, E>>,
}

// The rejection mapper is captured when the breaker is attached, so only
// pipelines with a breaker need `E: From<CircuitOpen>`.
struct BreakerStage<E> {
    breaker: Arc<CircuitBreakerPolicy>,
    on_open: fn(CircuitOpen) -> E,
}

impl<E> Clone for BreakerStage<E> {
    fn clone(&self) -> Self {
        Self {
            breaker: Arc::clone(&self.breaker),
            on_open: self.on_open,
        }
    }
}

impl<T, E> Resilience<T, E> {
    /// Create an empty pipeline. With no stages configured,
    /// [`execute`](Self::execute) simply calls the action once.
    pub fn new() -> Self {
        Self {
            retry: None,
            circuit_breaker: None,
            fallback: None,
        }
    }

    /// Build a pipeline from configuration data.
    ///
    /// Every present section is validated, and a fresh breaker is created
    /// for the breaker section. Attach a fallback afterwards with
    /// [`with_fallback`](Self::with_fallback).
    pub fn from_config(config: &ResilienceConfig) -> Result<Self, ConfigError>
    where
        E: From<CircuitOpen>,
    {
        config.validate()?;
        let mut pipeline = Self::new();
        pipeline.retry = config.retry;
        if let Some(breaker) = &config.circuit_breaker {
            pipeline = pipeline.with_circuit_breaker(breaker.build()?);
        }
        Ok(pipeline)
    }

    /// Set the retry stage, replacing any earlier one.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Set the circuit breaker stage, replacing any earlier one.
    ///
    /// Pass an `Arc` to share one breaker between several pipelines that
    /// protect the same resource. Rejections reach the caller as
    /// `E::from(CircuitOpen)`; pipelines without a breaker place no such
    /// requirement on `E`.
    pub fn with_circuit_breaker(mut self, breaker: impl Into<Arc<CircuitBreakerPolicy>>) -> Self
    where
        E: From<CircuitOpen>,
    {
        self.circuit_breaker = Some(BreakerStage {
            breaker: breaker.into(),
            on_open: E::from,
        });
        self
    }

    /// Set the fallback stage, replacing any earlier one.
    pub fn with_fallback(mut self, fallback: FallbackPolicy<T, E>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// The configured retry stage.
    pub fn retry(&self) -> Option<&RetryPolicy> {
        self.retry.as_ref()
    }

    /// The configured circuit breaker stage.
    pub fn circuit_breaker(&self) -> Option<&Arc<CircuitBreakerPolicy>> {
        self.circuit_breaker.as_ref().map(|stage| &stage.breaker)
    }

    /// True if a fallback stage is configured.
    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// Run `action` through the configured stages.
    ///
    /// See the [module documentation](self) for the exact order and the
    /// number of times `action` may be invoked.
    pub fn execute<F>(&self, mut action: F) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
    {
        #[cfg(feature = "tracing")]
        tracing::trace!(stage = "retry", "running pipeline");
        let mut result = match &self.retry {
            Some(retry) => retry.execute(&mut action),
            None => action(),
        };

        if result.is_err() {
            if let Some(stage) = &self.circuit_breaker {
                #[cfg(feature = "tracing")]
                tracing::trace!(stage = "circuit_breaker", "running pipeline");
                result = stage.breaker.execute_with(stage.on_open, &mut action);
            }
        }

        if result.is_err() {
            if let Some(fallback) = &self.fallback {
                #[cfg(feature = "tracing")]
                tracing::trace!(stage = "fallback", "running pipeline");
                return fallback.execute(&mut action);
            }
        }

        result
    }
}

impl<T, E> Default for Resilience<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> Clone for Resilience<T, E> {
    fn clone(&self) -> Self {
        Self {
            retry: self.retry,
            circuit_breaker: self.circuit_breaker.clone(),
            fallback: self.fallback.clone(),
        }
    }
}

impl<T, E> fmt::Debug for Resilience<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resilience")
            .field("retry", &self.retry)
            .field("circuit_breaker", &self.circuit_breaker())
            .field("fallback", &self.fallback)
            .finish()
    }
}
