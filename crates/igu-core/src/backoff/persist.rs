//! Persist BackoffClock to disk (JSON under XDG state dir) so rate limits survive restarts.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::SystemTime;

use crate::clock::{from_unix_millis, to_unix_millis};
use crate::interest_group::{GroupKey, Origin};

use super::policy::BackoffPolicy;
use super::state::BackoffClock;

/// One persisted backoff entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedEntry {
    pub owner: Origin,
    pub name: String,
    /// Next eligible update time, Unix milliseconds.
    pub next_eligible_ms: u64,
}

/// Snapshot of a BackoffClock for JSON serialization. Periods are not stored;
/// they always come from config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedBackoff {
    #[serde(default = "default_version")]
    pub version: u8,
    pub entries: Vec<PersistedEntry>,
}

fn default_version() -> u8 {
    1
}

impl BackoffClock {
    /// Default path for the backoff file: `~/.local/state/igu/backoff.json`.
    pub fn default_path() -> Result<std::path::PathBuf> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("igu")?;
        Ok(xdg_dirs.get_state_home().join("igu").join("backoff.json"))
    }

    /// Serializable snapshot, sorted by key for stable output.
    pub fn to_snapshot(&self) -> PersistedBackoff {
        let mut entries: Vec<PersistedEntry> = self
            .entries
            .iter()
            .map(|(k, next)| PersistedEntry {
                owner: k.owner.clone(),
                name: k.name.clone(),
                next_eligible_ms: to_unix_millis(*next),
            })
            .collect();
        entries.sort_by(|a, b| (&a.owner, &a.name).cmp(&(&b.owner, &b.name)));
        PersistedBackoff {
            version: 1,
            entries,
        }
    }

    /// Restore from a snapshot. Entries already in the past at `now` are dropped.
    pub fn from_snapshot(snapshot: PersistedBackoff, policy: BackoffPolicy, now: SystemTime) -> Self {
        let mut clock = BackoffClock::new(policy);
        for e in snapshot.entries {
            let next = from_unix_millis(e.next_eligible_ms);
            if next > now {
                clock.entries.insert(GroupKey::new(e.owner, e.name), next);
            }
        }
        clock
    }

    /// Save current state to the given path (creates parent dir if needed).
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let snapshot = self.to_snapshot();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&snapshot).context("serialize backoff state")?;
        std::fs::write(path, json)
            .with_context(|| format!("write backoff state: {}", path.display()))?;
        Ok(())
    }

    /// Load state from the given path. A missing file yields `None` so the
    /// caller can start from an empty clock.
    pub fn load_from_path(
        path: &Path,
        policy: BackoffPolicy,
        now: SystemTime,
    ) -> Result<Option<BackoffClock>> {
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("read backoff state: {}", path.display()))
            }
        };
        let snapshot: PersistedBackoff = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse backoff state: {}", path.display()))?;
        Ok(Some(BackoffClock::from_snapshot(snapshot, policy, now)))
    }
}
