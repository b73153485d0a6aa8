//! In-memory next-eligible-update times per interest group.

use std::collections::HashMap;
use std::time::SystemTime;

use crate::interest_group::GroupKey;

use super::policy::{BackoffPolicy, UpdateOutcome};

/// Tracks, per `(owner, name)`, the earliest time another update may be
/// attempted.
///
/// Entries are created lazily on the first recorded outcome. A key with no
/// entry is always eligible, so entries whose time has passed can be pruned
/// without changing behaviour.
#[derive(Debug, Clone)]
pub struct BackoffClock {
    pub(super) entries: HashMap<GroupKey, SystemTime>,
    pub(super) policy: BackoffPolicy,
}

impl BackoffClock {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self {
            entries: HashMap::new(),
            policy,
        }
    }

    pub fn policy(&self) -> BackoffPolicy {
        self.policy
    }

    /// Record the outcome of an attempt finished at `now` and return the
    /// resulting next-eligible time (`None` if the key has never been
    /// backed off).
    ///
    /// The stored time only ever moves forward.
    pub fn record_outcome(
        &mut self,
        key: &GroupKey,
        outcome: UpdateOutcome,
        now: SystemTime,
    ) -> Option<SystemTime> {
        let Some(delay) = self.policy.delay_for(outcome) else {
            return self.entries.get(key).copied();
        };
        let candidate = now + delay;
        let slot = self.entries.entry(key.clone()).or_insert(candidate);
        if *slot < candidate {
            *slot = candidate;
        }
        Some(*slot)
    }

    /// True if an update for `key` may start at `now`.
    pub fn is_eligible(&self, key: &GroupKey, now: SystemTime) -> bool {
        match self.entries.get(key) {
            Some(next) => *next <= now,
            None => true,
        }
    }

    pub fn next_eligible(&self, key: &GroupKey) -> Option<SystemTime> {
        self.entries.get(key).copied()
    }

    /// Forget a key, e.g. because its interest group was removed.
    pub fn evict(&mut self, key: &GroupKey) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Drop entries that no longer restrict anything. Returns how many were removed.
    pub fn prune(&mut self, now: SystemTime) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, next| *next > now);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for BackoffClock {
    fn default() -> Self {
        Self::new(BackoffPolicy::default())
    }
}
