//! Runtime knobs for rounds and jobs.

use std::time::Duration;

use crate::config;

/// Concurrency and timing limits used by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateSettings {
    /// Max jobs in flight within one round.
    pub max_parallel_updates: usize,
    /// Queued round requests older than this when the active round
    /// finishes are dropped.
    pub max_round_duration: Duration,
    /// Per-request fetch timeout.
    pub fetch_timeout: Duration,
}

impl Default for UpdateSettings {
    fn default() -> Self {
        Self {
            max_parallel_updates: config::DEFAULT_MAX_PARALLEL_UPDATES,
            max_round_duration: Duration::from_secs(config::DEFAULT_MAX_ROUND_DURATION_SECS),
            fetch_timeout: Duration::from_secs(config::DEFAULT_FETCH_TIMEOUT_SECS),
        }
    }
}

impl UpdateSettings {
    pub fn with_max_parallel_updates(mut self, n: usize) -> Self {
        self.max_parallel_updates = n.max(1);
        self
    }

    pub fn with_max_round_duration(mut self, d: Duration) -> Self {
        self.max_round_duration = d;
        self
    }

    pub fn with_fetch_timeout(mut self, d: Duration) -> Self {
        self.fetch_timeout = d;
        self
    }
}
