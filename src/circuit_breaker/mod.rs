//! Circuit breaking for a protected resource.
//!
//! A [`CircuitBreakerPolicy`] tracks consecutive failures of the actions run
//! through it and short-circuits further calls once a threshold is crossed.
//!
//! # State machine
//!
//! Evaluated at the start of every [`execute`](CircuitBreakerPolicy::execute),
//! where "recovered" means more than `recovery_timeout` has passed since the
//! last recorded failure:
//!
//! | State | Recovered? | Next state | Call |
//! |---|---|---|---|
//! | Closed | any | Closed | runs |
//! | Open | yes | HalfOpen | runs |
//! | Open | no | Open | rejected with [`CircuitOpen`](crate::CircuitOpen) |
//! | HalfOpen | yes | Closed | runs |
//! | HalfOpen | no | HalfOpen | runs |
//!
//! After the action runs, a failure increments the failure count, opens the
//! circuit if the count has reached the threshold, and records the failure
//! time. A success resets the count to zero and leaves the state alone.

mod policy;
mod state;

pub use policy::CircuitBreakerPolicy;
pub use state::CircuitState;

#[cfg(test)]
mod tests;
