//! Per-owner permission check consulted once per round build.

use std::collections::HashSet;

use crate::interest_group::Origin;

pub trait PolicyGate: Send + Sync {
    /// False vetoes the whole round: it is built with zero jobs.
    fn is_update_allowed(&self, owner: &Origin) -> bool;
}

/// Allows every owner.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl PolicyGate for AllowAll {
    fn is_update_allowed(&self, _owner: &Origin) -> bool {
        true
    }
}

/// Deny-list of owners, typically from `blocked_owners` in config.
#[derive(Debug, Clone, Default)]
pub struct OwnerPolicy {
    blocked: HashSet<Origin>,
}

impl OwnerPolicy {
    pub fn new(blocked: impl IntoIterator<Item = Origin>) -> Self {
        Self {
            blocked: blocked.into_iter().collect(),
        }
    }
}

impl PolicyGate for OwnerPolicy {
    fn is_update_allowed(&self, owner: &Origin) -> bool {
        !self.blocked.contains(owner)
    }
}
