//! Update scheduler.
//!
//! Requests for an owner become rounds: one fetch job per eligible interest
//! group, run through a bounded worker pool. Exactly one round runs at a
//! time; other owners wait in a deduplicated FIFO and are dropped if they
//! waited longer than the max round duration when their turn comes.

mod actor;
mod admission;
mod context;
mod guard;
mod job;
mod round;
mod settings;

pub use actor::{SchedulerStatus, UpdateManager};
pub use admission::{Admit, Advance, AdmissionQueue, RoundRequest};
pub use context::{Collaborators, UpdateContext};
pub use job::{FetchJob, JobOutcome, JobState};
pub use round::{Round, RoundReport};
pub use settings::UpdateSettings;
