//! `igu status` – list stored groups and their next eligible update time.

use anyhow::Result;
use igu_core::config::UpdaterConfig;
use igu_core::interest_group::{InterestGroup, Origin};
use std::time::{Duration, SystemTime};

use crate::cli::snapshots::SnapshotPaths;

pub async fn run_status(cfg: &UpdaterConfig, paths: &SnapshotPaths, owner: Option<&Origin>) -> Result<()> {
    let (_, policy) = cfg.settings()?;
    let store = paths.load_store()?;
    let backoff = paths.load_backoff(policy)?;
    let now = SystemTime::now();

    let groups: Vec<InterestGroup> = match owner {
        Some(o) => store.groups_for_owner(o).await,
        None => store.all().await,
    };
    if groups.is_empty() {
        println!("No interest groups stored.");
        return Ok(());
    }

    println!("{:<28} {:<20} {:<12} {}", "OWNER", "NAME", "EXPIRES", "NEXT UPDATE");
    for g in groups {
        let expires = if g.is_expired(now) {
            "expired".to_string()
        } else {
            format!("in {}", format_wait(until(g.expiry, now)))
        };
        let next = if !g.is_updatable() {
            "not updatable".to_string()
        } else {
            match backoff.next_eligible(&g.key()) {
                Some(t) if t > now => format!("in {}", format_wait(until(t, now))),
                _ => "now".to_string(),
            }
        };
        println!("{:<28} {:<20} {:<12} {}", g.owner, g.name, expires, next);
    }
    Ok(())
}

fn until(t: SystemTime, now: SystemTime) -> Duration {
    t.duration_since(now).unwrap_or_default()
}

/// Coarse human duration: `2d3h`, `5h12m`, `4m10s`, `9s`.
fn format_wait(d: Duration) -> String {
    let secs = d.as_secs();
    let (days, hours, mins, s) = (secs / 86400, secs / 3600 % 24, secs / 60 % 60, secs % 60);
    if days > 0 {
        format!("{days}d{hours}h")
    } else if hours > 0 {
        format!("{hours}h{mins}m")
    } else if mins > 0 {
        format!("{mins}m{s}s")
    } else {
        format!("{s}s")
    }
}
