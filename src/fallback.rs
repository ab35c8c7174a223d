//! Substitute a secondary action when the primary one fails.
//!
//! ```rust
//! use resilience::FallbackPolicy;
//!
//! let fallback = FallbackPolicy::new(|| Ok::<_, String>("cached"));
//!
//! let result = fallback.execute(|| Err("origin unreachable".to_string()));
//! assert_eq!(result, Ok("cached"));
//! ```

use std::fmt;
use std::sync::Arc;

type FallbackFn<T, E> = dyn Fn() -> Result<T, E> + Send + Sync;

/// Runs a fallback action in place of a failed primary action.
///
/// The fallback's outcome, success or failure, fully replaces the primary's.
/// The primary error is dropped; it is not chained into the fallback's error.
///
/// The policy is immutable and cheap to clone; clones share the same
/// fallback action.
pub struct FallbackPolicy<T, E> {
    fallback: Arc<FallbackFn<T, E>>,
}

impl<T, E> FallbackPolicy<T, E> {
    /// Create a policy that runs `fallback` whenever the primary fails.
    pub fn new<F>(fallback: F) -> Self
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
    {
        Self {
            fallback: Arc::new(fallback),
        }
    }

    /// Run `action`; if it fails, run the fallback and return its result.
    pub fn execute<F>(&self, action: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        match action() {
            Ok(value) => Ok(value),
            Err(_) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("primary action failed, running fallback");
                (self.fallback)()
            }
        }
    }
}

impl<T, E> Clone for FallbackPolicy<T, E> {
    fn clone(&self) -> Self {
        Self {
            fallback: Arc::clone(&self.fallback),
        }
    }
}

impl<T, E> fmt::Debug for FallbackPolicy<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FallbackPolicy")
            .field("fallback", &"<fn>")
            .finish()
    }
}
