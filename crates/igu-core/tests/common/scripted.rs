//! In-process fetcher and decoder whose behavior tests script per URL.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use igu_core::decode::{DecodeError, Decoder, JsonDecoder};
use igu_core::fetch::{FetchError, Fetcher};
use serde_json::Value;
use url::Url;

#[derive(Debug, Clone)]
pub enum Reply {
    Body(String),
    Fail(FetchError),
    /// Respond with the body after the delay.
    Delay(Duration, String),
    /// Never respond.
    Hang,
}

#[derive(Default)]
struct InFlight {
    total: usize,
    per_owner: HashMap<String, usize>,
}

/// Fetcher with scripted replies. Unscripted URLs answer `{}`.
#[derive(Default)]
pub struct ScriptedFetcher {
    replies: Mutex<HashMap<String, Reply>>,
    started: Mutex<Vec<String>>,
    in_flight: Mutex<InFlight>,
    max_in_flight: AtomicUsize,
    max_owners_in_flight: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn reply(&self, url: &str, reply: Reply) {
        self.replies.lock().unwrap().insert(url.to_string(), reply);
    }

    pub fn calls(&self) -> usize {
        self.started.lock().unwrap().len()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.started.lock().unwrap().iter().filter(|u| *u == url).count()
    }

    /// URLs in the order their fetches started.
    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().unwrap().total
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn max_owners_in_flight(&self) -> usize {
        self.max_owners_in_flight.load(Ordering::SeqCst)
    }

    fn enter(&self, owner: &str) {
        let mut f = self.in_flight.lock().unwrap();
        f.total += 1;
        *f.per_owner.entry(owner.to_string()).or_default() += 1;
        self.max_in_flight.fetch_max(f.total, Ordering::SeqCst);
        self.max_owners_in_flight.fetch_max(f.per_owner.len(), Ordering::SeqCst);
    }

    fn leave(&self, owner: &str) {
        let mut f = self.in_flight.lock().unwrap();
        f.total -= 1;
        if let Some(n) = f.per_owner.get_mut(owner) {
            *n -= 1;
            if *n == 0 {
                f.per_owner.remove(owner);
            }
        }
    }
}

/// Leaves the in-flight set when the fetch finishes or is dropped.
struct InFlightGuard<'a> {
    fetcher: &'a ScriptedFetcher,
    owner: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.fetcher.leave(&self.owner);
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, url: &Url, _timeout: Duration) -> Result<Vec<u8>, FetchError> {
        let key = url.to_string();
        let owner = url.origin().ascii_serialization();
        self.started.lock().unwrap().push(key.clone());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Reply::Body("{}".to_string()));

        self.enter(&owner);
        let _guard = InFlightGuard {
            fetcher: self,
            owner,
        };
        match reply {
            Reply::Body(body) => Ok(body.into_bytes()),
            Reply::Fail(e) => Err(e),
            Reply::Delay(d, body) => {
                tokio::time::sleep(d).await;
                Ok(body.into_bytes())
            }
            Reply::Hang => std::future::pending().await,
        }
    }
}

/// JSON decoder that can be switched to report a crash.
#[derive(Default)]
pub struct CrashingDecoder {
    pub crash: AtomicBool,
}

impl Decoder for CrashingDecoder {
    fn decode(&self, body: &[u8]) -> Result<Value, DecodeError> {
        if self.crash.load(Ordering::SeqCst) {
            return Err(DecodeError::Crashed);
        }
        JsonDecoder.decode(body)
    }
}
