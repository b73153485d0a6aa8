#![allow(dead_code)]

pub mod scripted;
pub mod update_server;

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use igu_core::backoff::{BackoffClock, BackoffPolicy};
use igu_core::clock::{from_unix_millis, TokioClock};
use igu_core::interest_group::{Ad, InterestGroup, Origin};
use igu_core::scheduler::{Collaborators, UpdateManager, UpdateSettings};
use igu_core::store::MemoryStore;
use url::Url;

use self::scripted::ScriptedFetcher;

pub const SUCCESS: Duration = Duration::from_secs(24 * 3600);
pub const FAIL: Duration = Duration::from_secs(3600);

/// Wall-clock start of every scheduler test.
pub fn t0() -> SystemTime {
    from_unix_millis(1_700_000_000_000)
}

pub fn origin(s: &str) -> Origin {
    Origin::parse(s).unwrap()
}

pub fn update_url(owner: &str, name: &str) -> String {
    format!("{owner}/update/{name}")
}

/// Updatable group expiring a day after `t0`, with one old ad.
pub fn group(owner: &str, name: &str) -> InterestGroup {
    let mut g = InterestGroup::new(origin(owner), name, t0() + Duration::from_secs(86400));
    g.update_url = Some(Url::parse(&update_url(owner, name)).unwrap());
    g.ads = Some(vec![Ad::new(Url::parse("https://ex.com/old").unwrap())]);
    g
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub fetcher: Arc<ScriptedFetcher>,
    pub manager: UpdateManager,
}

impl Harness {
    pub fn new(groups: Vec<InterestGroup>, settings: UpdateSettings) -> Self {
        Self::with(groups, settings, |c| c)
    }

    /// Like `new`, with a hook to swap collaborators.
    pub fn with(
        groups: Vec<InterestGroup>,
        settings: UpdateSettings,
        customize: impl FnOnce(Collaborators) -> Collaborators,
    ) -> Self {
        let store = Arc::new(MemoryStore::from_groups(groups));
        let fetcher = Arc::new(ScriptedFetcher::default());
        let collaborators = Collaborators::new(store.clone())
            .with_fetcher(fetcher.clone())
            .with_clock(Arc::new(TokioClock::starting_at(t0())));
        let manager = UpdateManager::spawn(
            customize(collaborators),
            settings,
            BackoffClock::new(BackoffPolicy::new(SUCCESS, FAIL)),
        );
        Self {
            store,
            fetcher,
            manager,
        }
    }
}

pub fn settings() -> UpdateSettings {
    UpdateSettings::default()
        .with_max_parallel_updates(5)
        .with_max_round_duration(Duration::from_secs(600))
        .with_fetch_timeout(Duration::from_secs(30))
}
