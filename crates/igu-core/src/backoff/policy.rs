use std::time::Duration;

use crate::config;

/// Outcome of one update attempt, as far as rate limiting is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Response fetched, validated and merged.
    Succeeded,
    /// Response fetched but unusable (bad JSON, schema violation, identity
    /// mismatch, decoder crash).
    Malformed,
    /// Transport failure that says something about the server (timeout,
    /// reset, HTTP error status).
    TransientFailure,
    /// No network path at all; nothing learned about the server.
    Disconnected,
}

/// Backoff periods per outcome kind.
///
/// Malformed responses get the long success period so a broken server is not
/// hammered; disconnected failures get none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub success_backoff: Duration,
    pub fail_backoff: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            success_backoff: Duration::from_secs(config::DEFAULT_SUCCESS_BACKOFF_SECS),
            fail_backoff: Duration::from_secs(config::DEFAULT_FAIL_BACKOFF_SECS),
        }
    }
}

impl BackoffPolicy {
    pub fn new(success_backoff: Duration, fail_backoff: Duration) -> Self {
        Self {
            success_backoff,
            fail_backoff,
        }
    }

    /// Delay before the next attempt, or `None` if the clock must not move.
    pub fn delay_for(&self, outcome: UpdateOutcome) -> Option<Duration> {
        match outcome {
            UpdateOutcome::Succeeded | UpdateOutcome::Malformed => Some(self.success_backoff),
            UpdateOutcome::TransientFailure => Some(self.fail_backoff),
            UpdateOutcome::Disconnected => None,
        }
    }
}
