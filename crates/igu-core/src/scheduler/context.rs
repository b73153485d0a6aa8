//! Collaborators and shared state handed to rounds and jobs.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::backoff::BackoffClock;
use crate::clock::{Clock, TokioClock};
use crate::decode::{Decoder, JsonDecoder};
use crate::fetch::{CurlFetcher, Fetcher};
use crate::policy::{AllowAll, PolicyGate};
use crate::store::InterestGroupStore;

use super::UpdateSettings;

/// The external interfaces the updater depends on.
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn InterestGroupStore>,
    pub fetcher: Arc<dyn Fetcher>,
    pub decoder: Arc<dyn Decoder>,
    pub policy: Arc<dyn PolicyGate>,
    pub clock: Arc<dyn Clock>,
}

impl Collaborators {
    /// Default collaborators around `store`: libcurl fetcher with no size
    /// cap, `serde_json` decoder, no policy vetoes, tokio-driven clock.
    pub fn new(store: Arc<dyn InterestGroupStore>) -> Self {
        Self {
            store,
            fetcher: Arc::new(CurlFetcher::default()),
            decoder: Arc::new(JsonDecoder),
            policy: Arc::new(AllowAll),
            clock: Arc::new(TokioClock::new()),
        }
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_decoder(mut self, decoder: Arc<dyn Decoder>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn with_policy(mut self, policy: Arc<dyn PolicyGate>) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

/// Everything a round or job needs. Cheap to clone.
#[derive(Clone)]
pub struct UpdateContext {
    pub collaborators: Collaborators,
    pub settings: UpdateSettings,
    pub backoff: Arc<Mutex<BackoffClock>>,
}

impl UpdateContext {
    pub fn new(collaborators: Collaborators, settings: UpdateSettings, backoff: BackoffClock) -> Self {
        Self {
            collaborators,
            settings,
            backoff: Arc::new(Mutex::new(backoff)),
        }
    }

    pub(crate) fn now(&self) -> std::time::SystemTime {
        self.collaborators.clock.now()
    }
}
