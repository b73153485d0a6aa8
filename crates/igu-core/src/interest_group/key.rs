use std::fmt;

use serde::{Deserialize, Serialize};

use super::{InterestGroup, Origin};

/// Identity of an interest group.
///
/// At most one stored group exists per key; backoff state and round jobs are
/// indexed by it as well.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupKey {
    pub owner: Origin,
    pub name: String,
}

impl GroupKey {
    pub fn new(owner: Origin, name: impl Into<String>) -> Self {
        Self {
            owner,
            name: name.into(),
        }
    }

    /// Key of an existing group.
    pub fn of(group: &InterestGroup) -> Self {
        Self {
            owner: group.owner.clone(),
            name: group.name.clone(),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.owner, self.name)
    }
}
