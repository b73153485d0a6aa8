//! Per-group update rate limiting.
//!
//! Every finished update attempt moves the group's next-eligible time forward
//! according to what happened:
//! - success, or a response that could not be used: long backoff
//! - transport failure (timeout, reset, error status): short backoff
//! - no network path at all: unchanged, an immediate retry is allowed
//!
//! The clock is process-local and shared by all jobs through the scheduler.

mod persist;
mod policy;
mod state;

pub use persist::{PersistedBackoff, PersistedEntry};
pub use policy::{BackoffPolicy, UpdateOutcome};
pub use state::BackoffClock;
