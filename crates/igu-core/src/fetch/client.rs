//! libcurl-backed fetcher.
//!
//! The transfer runs on tokio's blocking pool. A drop guard raises an abort
//! flag that the progress callback polls, so dropping the future (e.g. on
//! the scheduler's timeout) stops the transfer mid-flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use super::classify::{classify_curl_error, classify_http_status};
use super::{FetchError, Fetcher};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_REDIRECTIONS: u32 = 10;

/// GETs update documents with libcurl.
#[derive(Debug, Clone, Default)]
pub struct CurlFetcher {
    max_response_bytes: Option<usize>,
}

impl CurlFetcher {
    pub fn new(max_response_bytes: Option<usize>) -> Self {
        Self { max_response_bytes }
    }
}

/// Sets the abort flag when the owning future is dropped.
struct AbortOnDrop(Arc<AtomicBool>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

#[async_trait]
impl Fetcher for CurlFetcher {
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<Vec<u8>, FetchError> {
        let abort = Arc::new(AtomicBool::new(false));
        let _guard = AbortOnDrop(Arc::clone(&abort));
        let url = url.to_string();
        let limit = self.max_response_bytes;
        tokio::task::spawn_blocking(move || get_blocking(&url, timeout, limit, &abort))
            .await
            .map_err(|e| FetchError::Network(format!("fetch task failed: {e}")))?
    }
}

fn get_blocking(
    url: &str,
    timeout: Duration,
    limit: Option<usize>,
    abort: &AtomicBool,
) -> Result<Vec<u8>, FetchError> {
    let mut body = Vec::new();
    let mut too_large = false;

    let mut easy = curl::easy::Easy::new();
    configure(&mut easy, url, timeout).map_err(|e| classify_curl_error(&e))?;

    let performed = {
        let mut transfer = easy.transfer();
        transfer
            .progress_function(|_, _, _, _| !abort.load(Ordering::Relaxed))
            .map_err(|e| classify_curl_error(&e))?;
        transfer
            .write_function(|data| {
                if limit.is_some_and(|max| body.len() + data.len() > max) {
                    too_large = true;
                    return Ok(0); // abort transfer
                }
                body.extend_from_slice(data);
                Ok(data.len())
            })
            .map_err(|e| classify_curl_error(&e))?;
        transfer.perform()
    };

    if let Err(e) = performed {
        if too_large {
            if let Some(limit) = limit {
                return Err(FetchError::TooLarge { limit });
            }
        }
        tracing::debug!(url, error = %e, "update fetch failed");
        return Err(classify_curl_error(&e));
    }

    let code = easy.response_code().map_err(|e| classify_curl_error(&e))?;
    classify_http_status(code)?;
    Ok(body)
}

fn configure(easy: &mut curl::easy::Easy, url: &str, timeout: Duration) -> Result<(), curl::Error> {
    easy.url(url)?;
    easy.get(true)?;
    easy.follow_location(true)?;
    easy.max_redirections(MAX_REDIRECTIONS)?;
    easy.connect_timeout(CONNECT_TIMEOUT.min(timeout))?;
    easy.timeout(timeout)?;
    easy.progress(true)?;

    let mut list = curl::easy::List::new();
    list.append("Accept: application/json")?;
    easy.http_headers(list)?;
    Ok(())
}
