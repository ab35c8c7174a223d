//! # Resilience
//!
//! Composable fault-tolerance policies for synchronous, fallible operations.
//!
//! An *action* is any closure returning `Result<T, E>`. The crate wraps actions
//! in three policies and a pipeline that chains them:
//!
//! - [`RetryPolicy`]: reattempt up to `max_attempts` times with a fixed delay
//! - [`CircuitBreakerPolicy`]: stop calling a failing dependency for a while
//! - [`FallbackPolicy`]: substitute a secondary action when the primary fails
//! - [`Resilience`]: run all configured stages in a fixed order
//!
//! Action errors are never wrapped. The only error the crate manufactures is
//! the [`CircuitOpen`] sentinel, which reaches callers through their own error
//! type via `E: From<CircuitOpen>`. Only breaker stages need that conversion;
//! retry and fallback work with any error type.
//!
//! ## Quick Example
//!
//! ```rust
//! use resilience::{
//!     BoxError, CircuitBreakerPolicy, FallbackPolicy, Resilience, RetryPolicy,
//! };
//! use std::time::Duration;
//!
//! let pipeline = Resilience::new()
//!     .with_retry(RetryPolicy::new(3, Duration::from_millis(1)))
//!     .with_circuit_breaker(CircuitBreakerPolicy::new(2, Duration::from_secs(5)))
//!     .with_fallback(FallbackPolicy::new(|| Ok::<_, BoxError>(0u32)));
//!
//! let mut calls = 0;
//! let result = pipeline.execute(|| {
//!     calls += 1;
//!     if calls < 2 { Err("flaky".into()) } else { Ok(calls) }
//! });
//!
//! assert_eq!(result.unwrap(), 2);
//! ```
//!
//! ## Blocking behavior
//!
//! Everything runs on the calling thread. Retry delays block for their full
//! duration and nothing can interrupt an in-flight action or sleep. A circuit
//! breaker holds its lock while the action runs, so calls through one breaker
//! are serialized.
//!
//! ## Cargo features
//!
//! - `tracing`: emit `tracing` events for retries, breaker transitions and
//!   fallbacks
//! - `serde`: `Serialize`/`Deserialize` for the configuration types
//! - `proptest`: `Arbitrary` impls for the configuration types

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod circuit_breaker;
pub mod config;
pub mod error;
pub mod fallback;
pub mod pipeline;
pub mod retry;
pub mod testing;

// Re-exports
pub use circuit_breaker::{CircuitBreakerPolicy, CircuitState};
pub use config::{CircuitBreakerConfig, ResilienceConfig};
pub use error::{is_circuit_open, BoxError, CircuitOpen, ConfigError};
pub use fallback::FallbackPolicy;
pub use pipeline::Resilience;
pub use retry::{RetryEvent, RetryPolicy};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::circuit_breaker::{CircuitBreakerPolicy, CircuitState};
    pub use crate::config::{CircuitBreakerConfig, ResilienceConfig};
    pub use crate::error::{is_circuit_open, BoxError, CircuitOpen, ConfigError};
    pub use crate::fallback::FallbackPolicy;
    pub use crate::pipeline::Resilience;
    pub use crate::retry::{RetryEvent, RetryPolicy};
}
