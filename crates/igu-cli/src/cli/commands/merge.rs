//! `igu merge` – dry-run an update document against a stored group.

use anyhow::{Context, Result};
use igu_core::decode::{Decoder, JsonDecoder};
use igu_core::interest_group::{GroupKey, Origin};
use igu_core::merge;
use igu_core::store::InterestGroupStore;
use std::path::Path;

use crate::cli::snapshots::SnapshotPaths;

pub async fn run_merge(paths: &SnapshotPaths, owner: Origin, name: &str, doc: &Path) -> Result<()> {
    let store = paths.load_store()?;
    let key = GroupKey::new(owner, name);
    let group = store
        .get(&key)
        .await?
        .ok_or_else(|| anyhow::anyhow!("no interest group {}", key))?;

    let body = std::fs::read(doc).with_context(|| format!("read update document: {}", doc.display()))?;
    let parsed = JsonDecoder
        .decode(&body)
        .with_context(|| format!("decode update document: {}", doc.display()))?;

    match merge::apply(&group, &parsed) {
        Ok(merged) => {
            println!("{}", serde_json::to_string_pretty(&merged)?);
        }
        Err(e) => {
            println!("rejected: {}", e);
        }
    }
    Ok(())
}
