//! Interest-group storage as seen by the updater.
//!
//! Real persistence lives elsewhere; the updater only needs the three
//! operations below, each atomic per key. `MemoryStore` is the in-process
//! implementation used by the CLI and tests.

mod memory;

use std::time::SystemTime;

use anyhow::Result;
use async_trait::async_trait;

use crate::interest_group::{GroupKey, InterestGroup, Origin};

pub use memory::MemoryStore;

#[async_trait]
pub trait InterestGroupStore: Send + Sync {
    /// Unexpired groups of `owner` that have an update URL.
    async fn candidate_groups(&self, owner: &Origin, now: SystemTime) -> Result<Vec<InterestGroup>>;

    /// Current record for `key`, expired or not.
    async fn get(&self, key: &GroupKey) -> Result<Option<InterestGroup>>;

    /// Replace the record for `key` with `applied`, but only if the stored
    /// record still equals `expected`, the one the merge was built from.
    /// Returns false (and stores nothing) if the group was left, re-joined
    /// or otherwise changed in between.
    async fn commit_merge(
        &self,
        key: &GroupKey,
        expected: &InterestGroup,
        applied: InterestGroup,
    ) -> Result<bool>;
}
