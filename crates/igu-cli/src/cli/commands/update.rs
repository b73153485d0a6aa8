//! `igu update` – run one update round for an owner.

use anyhow::Result;
use igu_core::config::UpdaterConfig;
use igu_core::interest_group::Origin;
use igu_core::scheduler::{Collaborators, RoundReport, UpdateManager};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::TryRecvError};

use crate::cli::snapshots::SnapshotPaths;

pub async fn run_update(cfg: &UpdaterConfig, paths: &SnapshotPaths, owner: Origin) -> Result<()> {
    drive(cfg, paths, |manager| manager.request_update(owner)).await
}

/// Load snapshots, start the scheduler, submit requests, wait for every
/// round to finish, print the reports and save the snapshots.
pub(super) async fn drive(
    cfg: &UpdaterConfig,
    paths: &SnapshotPaths,
    submit: impl FnOnce(&UpdateManager),
) -> Result<()> {
    let (settings, policy) = cfg.settings()?;
    let store = Arc::new(paths.load_store()?);
    let backoff = paths.load_backoff(policy)?;

    let collaborators = Collaborators::new(store.clone())
        .with_fetcher(Arc::new(cfg.fetcher()))
        .with_policy(Arc::new(cfg.owner_policy()));
    let manager = UpdateManager::spawn(collaborators, settings, backoff);
    let mut reports = manager.subscribe_reports();

    submit(&manager);
    manager.wait_idle().await;

    let (finished, skipped) = drain_reports(&mut reports);
    for report in &finished {
        print_report(report);
    }
    if skipped > 0 {
        println!("{} round report(s) not shown.", skipped);
    } else if finished.is_empty() {
        println!("No rounds ran.");
    }
    let status = manager.status();
    if status.dropped_stale > 0 {
        println!("{} queued round(s) dropped as stale.", status.dropped_stale);
    }

    paths.save(&store, &manager).await
}

/// Every buffered report, plus how many were overwritten before we read them.
fn drain_reports(rx: &mut broadcast::Receiver<RoundReport>) -> (Vec<RoundReport>, u64) {
    let mut reports = Vec::new();
    let mut skipped = 0;
    loop {
        match rx.try_recv() {
            Ok(report) => reports.push(report),
            Err(TryRecvError::Lagged(n)) => skipped += n,
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }
    (reports, skipped)
}

fn print_report(report: &RoundReport) {
    if report.outcomes.is_empty() {
        println!("{}: no eligible groups", report.owner);
        return;
    }
    println!("{}:", report.owner);
    for (key, outcome) in &report.outcomes {
        println!("  {:<32} {}", key.name, format!("{:?}", outcome).to_lowercase());
    }
    if report.lost > 0 {
        println!("  ({} job(s) lost)", report.lost);
    }
}
