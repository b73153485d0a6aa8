//! `igu auction-done` – post-auction hook: update every bidder owner once.

use anyhow::Result;
use igu_core::config::UpdaterConfig;
use igu_core::interest_group::Origin;

use super::update::drive;
use crate::cli::snapshots::SnapshotPaths;

pub async fn run_auction_done(
    cfg: &UpdaterConfig,
    paths: &SnapshotPaths,
    owners: Vec<Origin>,
) -> Result<()> {
    drive(cfg, paths, |manager| manager.on_auction_complete(owners)).await
}
