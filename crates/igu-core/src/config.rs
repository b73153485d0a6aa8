use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::backoff::BackoffPolicy;
use crate::fetch::CurlFetcher;
use crate::interest_group::Origin;
use crate::policy::OwnerPolicy;
use crate::scheduler::UpdateSettings;

pub const DEFAULT_MAX_PARALLEL_UPDATES: usize = 5;
pub const DEFAULT_MAX_ROUND_DURATION_SECS: u64 = 10 * 60;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 10 * 1024;
pub const DEFAULT_SUCCESS_BACKOFF_SECS: u64 = 24 * 60 * 60;
pub const DEFAULT_FAIL_BACKOFF_SECS: u64 = 60 * 60;

/// Backoff periods (optional `[backoff]` section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Wait after a successful or malformed update.
    pub success_secs: u64,
    /// Wait after a transport failure.
    pub fail_secs: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            success_secs: DEFAULT_SUCCESS_BACKOFF_SECS,
            fail_secs: DEFAULT_FAIL_BACKOFF_SECS,
        }
    }
}

/// Global configuration loaded from `~/.config/igu/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdaterConfig {
    /// Maximum concurrent update fetches within one round.
    pub max_parallel_updates: usize,
    /// Queued rounds that waited longer than this are dropped.
    pub max_round_duration_secs: u64,
    /// Per-request fetch timeout.
    pub fetch_timeout_secs: u64,
    /// Update bodies larger than this are rejected (None = no cap).
    #[serde(default)]
    pub max_response_bytes: Option<usize>,
    /// Owners whose updates are always vetoed.
    #[serde(default)]
    pub blocked_owners: Vec<Origin>,
    #[serde(default)]
    pub backoff: BackoffConfig,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            max_parallel_updates: DEFAULT_MAX_PARALLEL_UPDATES,
            max_round_duration_secs: DEFAULT_MAX_ROUND_DURATION_SECS,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            max_response_bytes: Some(DEFAULT_MAX_RESPONSE_BYTES),
            blocked_owners: Vec::new(),
            backoff: BackoffConfig::default(),
        }
    }
}

impl UpdaterConfig {
    /// Validate and convert to the scheduler's runtime settings.
    pub fn settings(&self) -> Result<(UpdateSettings, BackoffPolicy)> {
        if self.max_parallel_updates == 0 {
            bail!("max_parallel_updates must be at least 1");
        }
        if self.max_round_duration_secs == 0 || self.fetch_timeout_secs == 0 {
            bail!("max_round_duration_secs and fetch_timeout_secs must be non-zero");
        }
        if self.backoff.fail_secs == 0 {
            bail!("backoff.fail_secs must be non-zero");
        }
        if self.backoff.fail_secs >= self.backoff.success_secs {
            bail!(
                "backoff.fail_secs ({}) must be less than backoff.success_secs ({})",
                self.backoff.fail_secs,
                self.backoff.success_secs
            );
        }
        let settings = UpdateSettings::default()
            .with_max_parallel_updates(self.max_parallel_updates)
            .with_max_round_duration(Duration::from_secs(self.max_round_duration_secs))
            .with_fetch_timeout(Duration::from_secs(self.fetch_timeout_secs));
        let policy = BackoffPolicy::new(
            Duration::from_secs(self.backoff.success_secs),
            Duration::from_secs(self.backoff.fail_secs),
        );
        Ok((settings, policy))
    }

    pub fn owner_policy(&self) -> OwnerPolicy {
        OwnerPolicy::new(self.blocked_owners.iter().cloned())
    }

    pub fn fetcher(&self) -> CurlFetcher {
        CurlFetcher::new(self.max_response_bytes)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("igu")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<UpdaterConfig> {
    load_or_init_at(&config_path()?)
}

pub fn load_or_init_at(path: &Path) -> Result<UpdaterConfig> {
    if !path.exists() {
        let default_cfg = UpdaterConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path)?;
    let cfg: UpdaterConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = UpdaterConfig::default();
        assert_eq!(cfg.max_parallel_updates, 5);
        assert_eq!(cfg.max_round_duration_secs, 600);
        assert_eq!(cfg.fetch_timeout_secs, 30);
        assert_eq!(cfg.max_response_bytes, Some(10240));
        assert!(cfg.blocked_owners.is_empty());
        assert_eq!(cfg.backoff.success_secs, 86400);
        assert_eq!(cfg.backoff.fail_secs, 3600);
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = UpdaterConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: UpdaterConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            max_parallel_updates = 2
            max_round_duration_secs = 5
            fetch_timeout_secs = 10
            blocked_owners = ["https://blocked.test/"]

            [backoff]
            success_secs = 100
            fail_secs = 10
        "#;
        let cfg: UpdaterConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.max_parallel_updates, 2);
        assert!(cfg.max_response_bytes.is_none());
        assert_eq!(cfg.blocked_owners, vec![Origin::parse("https://blocked.test").unwrap()]);

        let (settings, policy) = cfg.settings().unwrap();
        assert_eq!(settings.max_parallel_updates, 2);
        assert_eq!(settings.max_round_duration, Duration::from_secs(5));
        assert_eq!(settings.fetch_timeout, Duration::from_secs(10));
        assert_eq!(policy, BackoffPolicy::new(Duration::from_secs(100), Duration::from_secs(10)));
    }

    #[test]
    fn backoff_section_is_optional() {
        let toml = r#"
            max_parallel_updates = 3
            max_round_duration_secs = 60
            fetch_timeout_secs = 30
        "#;
        let cfg: UpdaterConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.backoff, BackoffConfig::default());
    }

    #[test]
    fn invalid_owner_is_a_parse_error() {
        let toml = r#"
            max_parallel_updates = 3
            max_round_duration_secs = 60
            fetch_timeout_secs = 30
            blocked_owners = ["http://insecure.test"]
        "#;
        assert!(toml::from_str::<UpdaterConfig>(toml).is_err());
    }

    #[test]
    fn settings_rejects_bad_values() {
        let mut cfg = UpdaterConfig::default();
        cfg.max_parallel_updates = 0;
        assert!(cfg.settings().is_err());

        let mut cfg = UpdaterConfig::default();
        cfg.backoff.fail_secs = cfg.backoff.success_secs;
        assert!(cfg.settings().is_err());

        let mut cfg = UpdaterConfig::default();
        cfg.fetch_timeout_secs = 0;
        assert!(cfg.settings().is_err());
    }

    #[test]
    fn load_or_init_writes_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("igu").join("config.toml");
        let cfg = load_or_init_at(&path).unwrap();
        assert_eq!(cfg, UpdaterConfig::default());
        assert!(path.exists());
        assert_eq!(load_or_init_at(&path).unwrap(), cfg);
    }
}
