//! CLI for the interest-group update scheduler.

mod commands;
mod snapshots;

use anyhow::Result;
use clap::{Parser, Subcommand};
use igu_core::config;
use igu_core::interest_group::Origin;
use std::path::PathBuf;

use commands::{run_auction_done, run_merge, run_status, run_update};
use snapshots::SnapshotPaths;

/// Top-level CLI for the interest-group updater.
#[derive(Debug, Parser)]
#[command(name = "igu")]
#[command(about = "IGU: rate-limited interest-group update scheduler", long_about = None)]
pub struct Cli {
    /// Interest-group snapshot (JSON array). Defaults to the XDG state dir.
    #[arg(long, global = true, value_name = "PATH")]
    pub groups: Option<PathBuf>,

    /// Backoff snapshot (JSON). Defaults to the XDG state dir.
    #[arg(long, global = true, value_name = "PATH")]
    pub backoff: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run one update round for an owner and wait for it to finish.
    Update {
        /// Owner origin, e.g. https://dsp.example.
        owner: Origin,
    },

    /// Report a finished auction: update every bidder owner once.
    AuctionDone {
        /// Owner origins of the auction's bidders (winners and losers).
        #[arg(required = true)]
        owners: Vec<Origin>,
    },

    /// List stored interest groups and when each may next update.
    Status {
        /// Only show groups of this owner.
        #[arg(long)]
        owner: Option<Origin>,
    },

    /// Validate an update document against a stored group without saving.
    Merge {
        /// Owner origin of the group.
        owner: Origin,
        /// Group name.
        name: String,
        /// Path to the JSON update document.
        doc: PathBuf,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let paths = SnapshotPaths::resolve(cli.groups, cli.backoff)?;

        match cli.command {
            CliCommand::Update { owner } => run_update(&cfg, &paths, owner).await?,
            CliCommand::AuctionDone { owners } => run_auction_done(&cfg, &paths, owners).await?,
            CliCommand::Status { owner } => run_status(&cfg, &paths, owner.as_ref()).await?,
            CliCommand::Merge { owner, name, doc } => run_merge(&paths, owner, &name, &doc).await?,
        }

        Ok(())
    }
}
