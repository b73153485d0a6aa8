//! One fetch, decode, validate and merge cycle for a single interest group.

use url::Url;

use crate::backoff::UpdateOutcome;
use crate::fetch::FetchError;
use crate::interest_group::{GroupKey, InterestGroup};
use crate::merge;

use super::UpdateContext;

/// Lifecycle of a job. `Pending` and `InFlight` are the only non-terminal
/// states and a job never goes back to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    InFlight,
    Succeeded,
    Failed,
    TimedOut,
    Discarded,
}

/// How a job ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobOutcome {
    /// Document merged and committed.
    Succeeded,
    /// Body could not be decoded, or the document failed validation.
    Malformed,
    TimedOut,
    /// Transport error or non-2xx status.
    NetworkFailed,
    /// No network path at all.
    Disconnected,
    /// The group was gone or expired; nothing recorded.
    Discarded,
}

impl JobOutcome {
    /// What to record on the backoff clock, if anything.
    pub fn backoff_outcome(self) -> Option<UpdateOutcome> {
        match self {
            JobOutcome::Succeeded => Some(UpdateOutcome::Succeeded),
            JobOutcome::Malformed => Some(UpdateOutcome::Malformed),
            JobOutcome::TimedOut | JobOutcome::NetworkFailed => Some(UpdateOutcome::TransientFailure),
            JobOutcome::Disconnected => Some(UpdateOutcome::Disconnected),
            JobOutcome::Discarded => None,
        }
    }

    pub fn terminal_state(self) -> JobState {
        match self {
            JobOutcome::Succeeded => JobState::Succeeded,
            JobOutcome::TimedOut => JobState::TimedOut,
            JobOutcome::Discarded => JobState::Discarded,
            JobOutcome::Malformed | JobOutcome::NetworkFailed | JobOutcome::Disconnected => {
                JobState::Failed
            }
        }
    }

    fn from_fetch_error(e: &FetchError) -> Self {
        match e {
            FetchError::Timeout => JobOutcome::TimedOut,
            FetchError::Disconnected(_) => JobOutcome::Disconnected,
            _ => JobOutcome::NetworkFailed,
        }
    }
}

/// Stored state of a job's group.
enum Lookup {
    /// Exists and has not expired.
    Live(InterestGroup),
    /// Left or expired.
    Gone,
    Failed,
}

/// A single update attempt. Runs at most once.
#[derive(Debug, Clone)]
pub struct FetchJob {
    key: GroupKey,
    update_url: Url,
    state: JobState,
}

impl FetchJob {
    pub fn new(key: GroupKey, update_url: Url) -> Self {
        Self {
            key,
            update_url,
            state: JobState::Pending,
        }
    }

    /// Job for `group`, or `None` if it has no update URL.
    pub fn for_group(group: &InterestGroup) -> Option<Self> {
        let url = group.update_url.clone()?;
        Some(Self::new(group.key(), url))
    }

    pub fn key(&self) -> &GroupKey {
        &self.key
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Fetch, validate and merge. Never fails: every error becomes an outcome.
    pub async fn run(&mut self, ctx: &UpdateContext) -> JobOutcome {
        if self.state != JobState::Pending {
            tracing::warn!(group = %self.key, state = ?self.state, "job already ran");
            return JobOutcome::Discarded;
        }
        match self.lookup(ctx).await {
            Lookup::Live(_) => {}
            other => return self.discard(ctx, other).await,
        }

        self.state = JobState::InFlight;
        let timeout = ctx.settings.fetch_timeout;
        let fetched = match tokio::time::timeout(
            timeout,
            ctx.collaborators.fetcher.fetch(&self.update_url, timeout),
        )
        .await
        {
            Ok(res) => res,
            Err(_) => Err(FetchError::Timeout),
        };

        // Time has passed since the round was built; check again before
        // recording or merging anything.
        let current = match self.lookup(ctx).await {
            Lookup::Live(current) => current,
            other => return self.discard(ctx, other).await,
        };

        let outcome = match fetched {
            Err(e) => {
                tracing::debug!(group = %self.key, url = %self.update_url, error = %e, "update fetch failed");
                JobOutcome::from_fetch_error(&e)
            }
            Ok(body) => self.apply_body(ctx, &current, &body).await,
        };
        self.finish(ctx, outcome).await
    }

    async fn apply_body(&self, ctx: &UpdateContext, current: &InterestGroup, body: &[u8]) -> JobOutcome {
        let doc = match ctx.collaborators.decoder.decode(body) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::debug!(group = %self.key, error = %e, "update body not decodable");
                return JobOutcome::Malformed;
            }
        };
        let applied = match merge::apply(current, &doc) {
            Ok(applied) => applied,
            Err(e) => {
                tracing::debug!(group = %self.key, error = %e, "update document rejected");
                return JobOutcome::Malformed;
            }
        };
        match ctx.collaborators.store.commit_merge(&self.key, current, applied).await {
            Ok(true) => JobOutcome::Succeeded,
            Ok(false) => {
                tracing::debug!(group = %self.key, "group changed during update; merge dropped");
                JobOutcome::Discarded
            }
            Err(e) => {
                tracing::warn!(group = %self.key, error = %e, "commit failed");
                JobOutcome::Discarded
            }
        }
    }

    async fn lookup(&self, ctx: &UpdateContext) -> Lookup {
        match ctx.collaborators.store.get(&self.key).await {
            Ok(Some(g)) if !g.is_expired(ctx.now()) => Lookup::Live(g),
            Ok(_) => Lookup::Gone,
            Err(e) => {
                tracing::warn!(group = %self.key, error = %e, "store lookup failed");
                Lookup::Failed
            }
        }
    }

    /// Finish without recording an outcome. A group that is gone also loses
    /// its backoff entry.
    async fn discard(&mut self, ctx: &UpdateContext, lookup: Lookup) -> JobOutcome {
        if matches!(lookup, Lookup::Gone) {
            ctx.backoff.lock().await.evict(&self.key);
        }
        self.finish(ctx, JobOutcome::Discarded).await
    }

    async fn finish(&mut self, ctx: &UpdateContext, outcome: JobOutcome) -> JobOutcome {
        if let Some(kind) = outcome.backoff_outcome() {
            let now = ctx.now();
            let next = ctx.backoff.lock().await.record_outcome(&self.key, kind, now);
            tracing::debug!(group = %self.key, ?outcome, next_eligible = ?next, "update job finished");
        } else {
            tracing::debug!(group = %self.key, ?outcome, "update job discarded");
        }
        self.state = outcome.terminal_state();
        outcome
    }
}
