//! In-memory interest-group store with JSON snapshot persistence.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::SystemTime;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::interest_group::{GroupKey, InterestGroup, Origin};

use super::InterestGroupStore;

/// Groups keyed by `(owner, name)`; one record per key.
#[derive(Debug, Default)]
pub struct MemoryStore {
    groups: RwLock<BTreeMap<GroupKey, InterestGroup>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a list of groups. Later duplicates of a key win.
    pub fn from_groups(groups: impl IntoIterator<Item = InterestGroup>) -> Self {
        let map = groups.into_iter().map(|g| (g.key(), g)).collect();
        Self {
            groups: RwLock::new(map),
        }
    }

    /// Insert or replace a group. Returns the previous record, if any.
    pub async fn join(&self, group: InterestGroup) -> Option<InterestGroup> {
        self.groups.write().await.insert(group.key(), group)
    }

    /// Remove a group. Backoff state for it lives in the scheduler; call
    /// `UpdateManager::forget_group` as well, or it is dropped once the job
    /// that finds the group gone runs or its delay runs out.
    pub async fn leave(&self, key: &GroupKey) -> bool {
        self.groups.write().await.remove(key).is_some()
    }

    /// Every group of `owner`, including expired ones.
    pub async fn groups_for_owner(&self, owner: &Origin) -> Vec<InterestGroup> {
        self.groups
            .read()
            .await
            .values()
            .filter(|g| &g.owner == owner)
            .cloned()
            .collect()
    }

    pub async fn all(&self) -> Vec<InterestGroup> {
        self.groups.read().await.values().cloned().collect()
    }

    /// Default path for the groups file: `~/.local/state/igu/interest_groups.json`.
    pub fn default_path() -> Result<std::path::PathBuf> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("igu")?;
        Ok(xdg_dirs.get_state_home().join("igu").join("interest_groups.json"))
    }

    /// Load groups from a JSON array. A missing file yields an empty store.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("read interest groups: {}", path.display()))
            }
        };
        let groups: Vec<InterestGroup> = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse interest groups: {}", path.display()))?;
        Ok(Self::from_groups(groups))
    }

    pub async fn save_to_path(&self, path: &Path) -> Result<()> {
        let groups = self.all().await;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&groups).context("serialize interest groups")?;
        std::fs::write(path, json)
            .with_context(|| format!("write interest groups: {}", path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl InterestGroupStore for MemoryStore {
    async fn candidate_groups(&self, owner: &Origin, now: SystemTime) -> Result<Vec<InterestGroup>> {
        Ok(self
            .groups
            .read()
            .await
            .values()
            .filter(|g| &g.owner == owner && !g.is_expired(now) && g.is_updatable())
            .cloned()
            .collect())
    }

    async fn get(&self, key: &GroupKey) -> Result<Option<InterestGroup>> {
        Ok(self.groups.read().await.get(key).cloned())
    }

    async fn commit_merge(
        &self,
        key: &GroupKey,
        expected: &InterestGroup,
        applied: InterestGroup,
    ) -> Result<bool> {
        let mut groups = self.groups.write().await;
        match groups.get_mut(key) {
            Some(slot) if *slot == *expected => {
                *slot = applied;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
