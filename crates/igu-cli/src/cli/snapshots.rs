//! Where the CLI keeps its interest-group and backoff snapshots, and how it
//! loads and saves them around a scheduler run.

use anyhow::Result;
use igu_core::backoff::{BackoffClock, BackoffPolicy};
use igu_core::scheduler::UpdateManager;
use igu_core::store::MemoryStore;
use std::path::PathBuf;
use std::time::SystemTime;

#[derive(Debug, Clone)]
pub struct SnapshotPaths {
    pub groups: PathBuf,
    pub backoff: PathBuf,
}

impl SnapshotPaths {
    /// Use the given paths, falling back to the XDG state defaults.
    pub fn resolve(groups: Option<PathBuf>, backoff: Option<PathBuf>) -> Result<Self> {
        let groups = match groups {
            Some(p) => p,
            None => MemoryStore::default_path()?,
        };
        let backoff = match backoff {
            Some(p) => p,
            None => BackoffClock::default_path()?,
        };
        Ok(Self { groups, backoff })
    }

    pub fn load_store(&self) -> Result<MemoryStore> {
        MemoryStore::load_from_path(&self.groups)
    }

    /// Saved backoff state, or an empty clock if none was saved yet.
    pub fn load_backoff(&self, policy: BackoffPolicy) -> Result<BackoffClock> {
        let clock = BackoffClock::load_from_path(&self.backoff, policy, SystemTime::now())?;
        Ok(clock.unwrap_or_else(|| BackoffClock::new(policy)))
    }

    pub async fn save(&self, store: &MemoryStore, manager: &UpdateManager) -> Result<()> {
        store.save_to_path(&self.groups).await?;
        manager.save_backoff(&self.backoff).await?;
        tracing::debug!(
            groups = %self.groups.display(),
            backoff = %self.backoff.display(),
            "snapshots saved"
        );
        Ok(())
    }
}
