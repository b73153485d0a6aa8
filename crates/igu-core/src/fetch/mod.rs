//! Update-document transport.
//!
//! `Fetcher` is the seam the scheduler calls through; `CurlFetcher` is the
//! libcurl implementation. Every transport failure is folded into a
//! `FetchError`.

mod classify;
mod client;

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

pub use self::classify::{
    classify_connect_failure, classify_curl_error, classify_http_status, classify_resolve_failure,
};
pub use self::client::CurlFetcher;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,
    #[error("no network path: {0}")]
    Disconnected(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("HTTP {0}")]
    Http(u32),
    #[error("response exceeds {limit} bytes")]
    TooLarge { limit: usize },
    #[error("request aborted")]
    Aborted,
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET `url` and return the response body.
    ///
    /// Dropping the returned future must stop the transfer; the scheduler
    /// relies on that for its per-request timeout.
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<Vec<u8>, FetchError>;
}
