//! One owner's batch of update jobs, run with bounded parallelism.
//!
//! The job set is fixed when the round is built. The round deadline only
//! matters to admission of the next round; jobs here always drain.

use std::time::SystemTime;

use crate::interest_group::{GroupKey, Origin};

use super::job::{FetchJob, JobOutcome};
use super::UpdateContext;

/// Per-group results of a finished round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundReport {
    pub owner: Origin,
    pub outcomes: Vec<(GroupKey, JobOutcome)>,
    /// Job tasks that panicked or were cancelled before reporting.
    pub lost: usize,
}

impl RoundReport {
    pub fn empty(owner: Origin) -> Self {
        Self {
            owner,
            outcomes: Vec::new(),
            lost: 0,
        }
    }

    pub fn count(&self, outcome: JobOutcome) -> usize {
        self.outcomes.iter().filter(|(_, o)| *o == outcome).count()
    }

    pub fn outcome_of(&self, key: &GroupKey) -> Option<JobOutcome> {
        self.outcomes.iter().find(|(k, _)| k == key).map(|(_, o)| *o)
    }
}

#[derive(Debug)]
pub struct Round {
    owner: Origin,
    started_at: SystemTime,
    deadline: SystemTime,
    jobs: Vec<FetchJob>,
}

impl Round {
    /// Build the round for `owner`: one job per unexpired group with an
    /// update URL whose backoff has elapsed. A policy veto or a store
    /// failure gives an empty round.
    pub async fn build(owner: Origin, ctx: &UpdateContext) -> Round {
        let started_at = ctx.now();
        let deadline = started_at + ctx.settings.max_round_duration;
        let empty = |owner: Origin| Round {
            owner,
            started_at,
            deadline,
            jobs: Vec::new(),
        };

        if !ctx.collaborators.policy.is_update_allowed(&owner) {
            tracing::debug!(%owner, "updates vetoed by policy");
            return empty(owner);
        }
        let groups = match ctx.collaborators.store.candidate_groups(&owner, started_at).await {
            Ok(groups) => groups,
            Err(e) => {
                tracing::warn!(%owner, error = %e, "could not load candidate groups");
                return empty(owner);
            }
        };

        let backoff = ctx.backoff.lock().await;
        let jobs: Vec<FetchJob> = groups
            .iter()
            .filter(|g| backoff.is_eligible(&g.key(), started_at))
            .filter_map(FetchJob::for_group)
            .collect();
        drop(backoff);

        tracing::debug!(%owner, candidates = groups.len(), jobs = jobs.len(), "round built");
        Round {
            owner,
            started_at,
            deadline,
            jobs,
        }
    }

    pub fn owner(&self) -> &Origin {
        &self.owner
    }

    pub fn started_at(&self) -> SystemTime {
        self.started_at
    }

    pub fn deadline(&self) -> SystemTime {
        self.deadline
    }

    pub fn jobs(&self) -> &[FetchJob] {
        &self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Run every job with at most `max_parallel_updates` in flight; as one
    /// finishes the next pending job starts. Returns once all have finished.
    pub async fn run(self, ctx: &UpdateContext) -> RoundReport {
        let max_parallel = ctx.settings.max_parallel_updates.max(1);
        let mut report = RoundReport::empty(self.owner);
        let mut pending = self.jobs.into_iter();
        let mut join_set = tokio::task::JoinSet::new();

        loop {
            while join_set.len() < max_parallel {
                let Some(mut job) = pending.next() else {
                    break;
                };
                let ctx = ctx.clone();
                join_set.spawn(async move {
                    let outcome = job.run(&ctx).await;
                    (job.key().clone(), outcome)
                });
            }

            let Some(res) = join_set.join_next().await else {
                break;
            };
            match res {
                Ok(done) => report.outcomes.push(done),
                Err(e) => {
                    tracing::warn!(owner = %report.owner, error = %e, "update job task join");
                    report.lost += 1;
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backoff::{BackoffClock, BackoffPolicy, UpdateOutcome};
    use crate::clock::{from_unix_millis, TokioClock};
    use crate::fetch::{FetchError, Fetcher};
    use crate::interest_group::InterestGroup;
    use crate::policy::OwnerPolicy;
    use crate::scheduler::{Collaborators, UpdateSettings};
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use url::Url;

    /// Answers `{}` after one second, tracking peak concurrency.
    #[derive(Default)]
    struct CountingFetcher {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Fetcher for CountingFetcher {
        async fn fetch(&self, _url: &Url, _timeout: Duration) -> Result<Vec<u8>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(1)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(b"{}".to_vec())
        }
    }

    fn start() -> SystemTime {
        from_unix_millis(1_700_000_000_000)
    }

    fn owner() -> Origin {
        Origin::parse("https://a.test").unwrap()
    }

    fn groups(n: usize) -> Vec<InterestGroup> {
        (0..n)
            .map(|i| {
                let mut g = InterestGroup::new(owner(), format!("g{i}"), start() + Duration::from_secs(86400));
                g.update_url = Some(Url::parse(&format!("https://a.test/update/{i}")).unwrap());
                g
            })
            .collect()
    }

    fn context(store: MemoryStore, fetcher: Arc<CountingFetcher>, max_parallel: usize) -> UpdateContext {
        let collaborators = Collaborators::new(Arc::new(store))
            .with_fetcher(fetcher)
            .with_clock(Arc::new(TokioClock::starting_at(start())));
        UpdateContext::new(
            collaborators,
            UpdateSettings::default().with_max_parallel_updates(max_parallel),
            BackoffClock::new(BackoffPolicy::default()),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn runs_all_jobs_with_bounded_parallelism() {
        let fetcher = Arc::new(CountingFetcher::default());
        let ctx = context(MemoryStore::from_groups(groups(5)), fetcher.clone(), 2);

        let round = Round::build(owner(), &ctx).await;
        assert_eq!(round.len(), 5);
        assert_eq!(round.deadline(), round.started_at() + ctx.settings.max_round_duration);
        let report = round.run(&ctx).await;

        assert_eq!(report.count(JobOutcome::Succeeded), 5);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 5);
        assert_eq!(fetcher.peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn backed_off_groups_are_left_out() {
        let all = groups(3);
        let fetcher = Arc::new(CountingFetcher::default());
        let ctx = context(MemoryStore::from_groups(all.clone()), fetcher, 5);
        ctx.backoff
            .lock()
            .await
            .record_outcome(&all[1].key(), UpdateOutcome::TransientFailure, start());

        let round = Round::build(owner(), &ctx).await;
        let keys: Vec<_> = round.jobs().iter().map(|j| j.key().name.clone()).collect();
        assert_eq!(keys, vec!["g0".to_string(), "g2".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn policy_veto_builds_empty_round() {
        let fetcher = Arc::new(CountingFetcher::default());
        let mut ctx = context(MemoryStore::from_groups(groups(3)), fetcher.clone(), 5);
        ctx.collaborators.policy = Arc::new(OwnerPolicy::new([owner()]));

        let round = Round::build(owner(), &ctx).await;
        assert!(round.is_empty());
        let report = round.run(&ctx).await;
        assert!(report.outcomes.is_empty());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }
}
