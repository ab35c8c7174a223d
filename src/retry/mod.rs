//! Fixed-delay retry for synchronous actions.
//!
//! A [`RetryPolicy`] is plain data: a maximum number of attempts and a fixed
//! delay. It holds no per-call state, so one policy can be shared freely
//! between threads and pipelines.
//!
//! # Quick Start
//!
//! ```rust
//! use resilience::RetryPolicy;
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::new(3, Duration::from_millis(1));
//!
//! let mut calls = 0;
//! let result = policy.execute(|| {
//!     calls += 1;
//!     if calls < 3 { Err("busy") } else { Ok(calls) }
//! });
//!
//! assert_eq!(result, Ok(3));
//! ```
//!
//! # Semantics
//!
//! - The action is attempted up to `max_attempts` times.
//! - A success returns immediately, without waiting.
//! - Every failed attempt is followed by a blocking sleep of `delay`,
//!   including the final one, before the policy moves on.
//! - Once attempts are exhausted the most recent error is returned as-is;
//!   earlier errors are dropped.
//!
//! There is no backoff and no jitter: the delay never changes.

mod policy;

pub use policy::{RetryEvent, RetryPolicy};
