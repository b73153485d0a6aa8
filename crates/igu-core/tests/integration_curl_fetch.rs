//! Integration test: libcurl fetcher against a local HTTP server, alone and
//! driven by the scheduler.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::update_server::{self, Route};
use common::{origin, FAIL, SUCCESS};
use igu_core::backoff::{BackoffClock, BackoffPolicy};
use igu_core::clock::TokioClock;
use igu_core::fetch::{CurlFetcher, FetchError, Fetcher};
use igu_core::interest_group::{Ad, InterestGroup};
use igu_core::scheduler::{Collaborators, UpdateManager, UpdateSettings};
use igu_core::store::{InterestGroupStore, MemoryStore};
use url::Url;

const TIMEOUT: Duration = Duration::from_secs(5);

fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

#[tokio::test]
async fn fetch_returns_body_on_200() {
    let server = update_server::start(vec![("/update.json", Route::ok(r#"{"priority":2}"#))]);
    let body = CurlFetcher::default()
        .fetch(&url(&server.url("/update.json")), TIMEOUT)
        .await
        .unwrap();
    assert_eq!(body, br#"{"priority":2}"#.to_vec());
}

#[tokio::test]
async fn non_2xx_status_is_http_error() {
    let server = update_server::start(vec![("/gone", Route::status(410))]);
    let fetcher = CurlFetcher::default();

    let err = fetcher.fetch(&url(&server.url("/missing")), TIMEOUT).await.unwrap_err();
    assert_eq!(err, FetchError::Http(404));
    let err = fetcher.fetch(&url(&server.url("/gone")), TIMEOUT).await.unwrap_err();
    assert_eq!(err, FetchError::Http(410));
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let big = vec![b' '; 4096];
    let server = update_server::start(vec![("/big", Route::ok(big))]);
    let err = CurlFetcher::new(Some(1024))
        .fetch(&url(&server.url("/big")), TIMEOUT)
        .await
        .unwrap_err();
    assert_eq!(err, FetchError::TooLarge { limit: 1024 });

    let body = CurlFetcher::new(Some(8192))
        .fetch(&url(&server.url("/big")), TIMEOUT)
        .await
        .unwrap();
    assert_eq!(body.len(), 4096);
}

#[tokio::test]
async fn slow_server_times_out() {
    let server = update_server::start(vec![(
        "/slow",
        Route::ok("{}").delayed(Duration::from_secs(3)),
    )]);
    let err = CurlFetcher::default()
        .fetch(&url(&server.url("/slow")), Duration::from_secs(1))
        .await
        .unwrap_err();
    assert_eq!(err, FetchError::Timeout);
}

#[tokio::test]
async fn refused_connection_is_a_transient_failure() {
    let port = update_server::closed_port();
    let err = CurlFetcher::default()
        .fetch(&url(&format!("http://127.0.0.1:{port}/update")), TIMEOUT)
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Network(_)), "{err:?}");
}

#[tokio::test]
async fn scheduler_updates_group_over_http() {
    let server = update_server::start(vec![(
        "/ig/cars",
        Route::ok(
            r#"{"name":"cars","ads":[{"renderUrl":"https://ex.com/new","metadata":{"new_a":"b"}}],"trustedBiddingSignalsKeys":["k"]}"#,
        ),
    )]);
    let owner = origin("https://a.test");
    let mut g = InterestGroup::new(owner.clone(), "cars", std::time::SystemTime::now() + Duration::from_secs(3600));
    g.update_url = Some(url(&server.url("/ig/cars")));
    g.ads = Some(vec![Ad::new(url("https://ex.com/old"))]);

    let store = Arc::new(MemoryStore::from_groups([g.clone()]));
    let collaborators = Collaborators::new(store.clone())
        .with_fetcher(Arc::new(CurlFetcher::new(Some(10 * 1024))))
        .with_clock(Arc::new(TokioClock::new()));
    let manager = UpdateManager::spawn(
        collaborators,
        UpdateSettings::default().with_fetch_timeout(TIMEOUT),
        BackoffClock::new(BackoffPolicy::new(SUCCESS, FAIL)),
    );

    manager.request_update(owner);
    manager.wait_idle().await;

    let after = store.get(&g.key()).await.unwrap().unwrap();
    let ads = after.ads.unwrap();
    assert_eq!(ads[0].render_url.as_str(), "https://ex.com/new");
    assert_eq!(ads[0].metadata.as_deref(), Some(r#"{"new_a":"b"}"#));
    assert_eq!(after.trusted_bidding_signals_keys, Some(vec!["k".to_string()]));
    assert_eq!(after.expiry, g.expiry);
    assert!(!manager.is_eligible(&g.key()).await);
    assert_eq!(server.hits(), 1);
}
