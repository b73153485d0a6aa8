//! The scheduler actor and its handle.
//!
//! One task owns the admission queue. Callers and finished rounds talk to it
//! over an unbounded channel; it publishes a `SchedulerStatus` snapshot after
//! every message and broadcasts each finished round's report.

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use anyhow::Result;
use tokio::sync::{broadcast, mpsc, watch};

use crate::backoff::{BackoffClock, PersistedBackoff};
use crate::interest_group::{GroupKey, Origin};

use super::admission::{Admit, AdmissionQueue, RoundRequest};
use super::guard::RoundCompletion;
use super::job::JobOutcome;
use super::round::{Round, RoundReport};
use super::{Collaborators, UpdateContext, UpdateSettings};

const REPORT_BUFFER: usize = 64;

pub(super) enum Command {
    Request(Origin),
    RoundFinished(RoundReport),
}

/// Point-in-time view of the scheduler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStatus {
    /// Owner whose round is running.
    pub active: Option<Origin>,
    /// Round requests waiting behind the active one.
    pub pending: usize,
    pub requests_processed: u64,
    pub rounds_completed: u64,
    /// Requests that were no-ops because the owner was already outstanding.
    pub coalesced: u64,
    /// Queued requests dropped because they waited past the max round duration.
    pub dropped_stale: u64,
}

impl SchedulerStatus {
    pub fn is_idle(&self) -> bool {
        self.active.is_none() && self.pending == 0
    }
}

/// Handle to the update scheduler. Cloning shares the same scheduler.
#[derive(Clone)]
pub struct UpdateManager {
    tx: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<SchedulerStatus>,
    reports: broadcast::Sender<RoundReport>,
    submitted: Arc<AtomicU64>,
    ctx: UpdateContext,
}

impl UpdateManager {
    /// Start the scheduler actor on the current tokio runtime.
    pub fn spawn(collaborators: Collaborators, settings: UpdateSettings, backoff: BackoffClock) -> Self {
        let ctx = UpdateContext::new(collaborators, settings, backoff);
        let (tx, rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(SchedulerStatus::default());
        let (reports, _) = broadcast::channel(REPORT_BUFFER);

        let actor = Actor {
            ctx: ctx.clone(),
            queue: AdmissionQueue::new(settings.max_round_duration),
            tx: tx.downgrade(),
            status_tx,
            reports: reports.clone(),
            status: SchedulerStatus::default(),
        };
        tokio::spawn(actor.run(rx));

        Self {
            tx,
            status: status_rx,
            reports,
            submitted: Arc::new(AtomicU64::new(0)),
            ctx,
        }
    }

    /// Ask for a round for `owner`. Coalesces with an outstanding request
    /// for the same owner; never reports an error to the caller.
    pub fn request_update(&self, owner: Origin) {
        self.submitted.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(Command::Request(owner)).is_err() {
            tracing::warn!("update scheduler is not running");
        }
    }

    /// Request one round per distinct bidder owner of a finished auction,
    /// whether or not that bidder won.
    pub fn on_auction_complete(&self, bidders: impl IntoIterator<Item = Origin>) {
        let mut seen = HashSet::new();
        for owner in bidders {
            if seen.insert(owner.clone()) {
                self.request_update(owner);
            }
        }
    }

    pub fn status(&self) -> SchedulerStatus {
        self.status.borrow().clone()
    }

    /// Resolves once every request submitted so far has been processed and
    /// no round is active or queued.
    pub async fn wait_idle(&self) {
        let target = self.submitted.load(Ordering::SeqCst);
        let mut rx = self.status.clone();
        let _ = rx
            .wait_for(|s| s.requests_processed >= target && s.is_idle())
            .await;
    }

    /// Reports of rounds that finish after this call.
    pub fn subscribe_reports(&self) -> broadcast::Receiver<RoundReport> {
        self.reports.subscribe()
    }

    pub fn settings(&self) -> UpdateSettings {
        self.ctx.settings
    }

    pub async fn is_eligible(&self, key: &GroupKey) -> bool {
        let now = self.ctx.now();
        self.ctx.backoff.lock().await.is_eligible(key, now)
    }

    pub async fn next_eligible_update(&self, key: &GroupKey) -> Option<SystemTime> {
        self.ctx.backoff.lock().await.next_eligible(key)
    }

    /// Drop backoff state for a group that no longer exists. Call this when
    /// deleting a group from the store.
    pub async fn forget_group(&self, key: &GroupKey) -> bool {
        self.ctx.backoff.lock().await.evict(key)
    }

    pub async fn backoff_snapshot(&self) -> PersistedBackoff {
        self.ctx.backoff.lock().await.to_snapshot()
    }

    pub async fn save_backoff(&self, path: &Path) -> Result<()> {
        self.ctx.backoff.lock().await.save_to_path(path)
    }
}

struct Actor {
    ctx: UpdateContext,
    queue: AdmissionQueue,
    /// Weak so the actor stops once every handle and round task is gone.
    tx: mpsc::WeakUnboundedSender<Command>,
    status_tx: watch::Sender<SchedulerStatus>,
    reports: broadcast::Sender<RoundReport>,
    status: SchedulerStatus,
}

impl Actor {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        while let Some(cmd) = rx.recv().await {
            match cmd {
                Command::Request(owner) => self.on_request(owner),
                Command::RoundFinished(report) => self.on_round_finished(report).await,
            }
            self.publish();
        }
        tracing::debug!("update scheduler stopped");
    }

    fn on_request(&mut self, owner: Origin) {
        self.status.requests_processed += 1;
        match self.queue.request(owner.clone(), self.ctx.now()) {
            Admit::Start(req) => {
                tracing::info!(owner = %req.owner, "update round started");
                self.start_round(req);
            }
            Admit::Queued => {
                tracing::debug!(%owner, pending = self.queue.pending_len(), "update round queued");
            }
            Admit::Coalesced => {
                self.status.coalesced += 1;
                tracing::debug!(%owner, "update request coalesced");
            }
        }
    }

    fn start_round(&mut self, req: RoundRequest) {
        let Some(tx) = self.tx.upgrade() else {
            tracing::warn!(owner = %req.owner, "scheduler shutting down; round not started");
            return;
        };
        let ctx = self.ctx.clone();
        tokio::spawn(async move {
            let completion = RoundCompletion::new(tx, req.owner.clone());
            let round = Round::build(req.owner, &ctx).await;
            let report = round.run(&ctx).await;
            completion.finish(report);
        });
    }

    async fn on_round_finished(&mut self, report: RoundReport) {
        let now = self.ctx.now();
        self.status.rounds_completed += 1;
        tracing::info!(
            owner = %report.owner,
            succeeded = report.count(JobOutcome::Succeeded),
            malformed = report.count(JobOutcome::Malformed),
            timed_out = report.count(JobOutcome::TimedOut),
            network_failed = report.count(JobOutcome::NetworkFailed),
            disconnected = report.count(JobOutcome::Disconnected),
            discarded = report.count(JobOutcome::Discarded),
            lost = report.lost,
            "update round finished"
        );

        let pruned = self.ctx.backoff.lock().await.prune(now);
        if pruned > 0 {
            tracing::debug!(pruned, "expired backoff entries pruned");
        }
        // No subscribers is fine.
        let _ = self.reports.send(report);

        let advance = self.queue.complete(now);
        for req in &advance.dropped {
            tracing::info!(owner = %req.owner, "queued update round dropped as stale");
        }
        self.status.dropped_stale += advance.dropped.len() as u64;
        if let Some(next) = advance.next {
            tracing::info!(owner = %next.owner, "update round started");
            self.start_round(next);
        }
    }

    fn publish(&mut self) {
        self.status.active = self.queue.active().cloned();
        self.status.pending = self.queue.pending_len();
        self.status_tx.send_replace(self.status.clone());
    }
}
