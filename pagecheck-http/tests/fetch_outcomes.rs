mod common;

use pagecheck_http::{FetchOutcome, HttpFetcher, PageFetcher};
use std::net::TcpListener;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAGE: &str = "<html><head><title>T</title></head><body><h1>H</h1></body></html>";

/// A localhost URL nothing is listening on.
fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

#[tokio::test]
async fn ok_response_returns_status_and_body() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new().unwrap();
    let out = fetcher.fetch(&server.uri()).await;

    assert_eq!(
        out,
        FetchOutcome::Success {
            status_code: 200,
            body: PAGE.to_string(),
        }
    );
}

#[tokio::test]
async fn server_errors_are_still_successes() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("down"))
        .mount(&server)
        .await;

    let out = HttpFetcher::new().unwrap().fetch(&server.uri()).await;
    match out {
        FetchOutcome::Success { status_code, body } => {
            assert_eq!(status_code, 503);
            assert_eq!(body, "down");
        }
        other => panic!("expected success, got {other:?}"),
    }
}

#[tokio::test]
async fn not_found_is_recorded_not_raised() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    let out = HttpFetcher::new().unwrap().fetch(&server.uri()).await;
    assert!(matches!(out, FetchOutcome::Success { status_code: 404, .. }), "{out:?}");
}

#[tokio::test]
async fn refused_connection_is_network_failure() {
    common::init_test_tracing();
    let out = HttpFetcher::new().unwrap().fetch(&refused_url()).await;
    match out {
        FetchOutcome::NetworkFailure { reason } => assert!(!reason.is_empty()),
        other => panic!("expected network failure, got {other:?}"),
    }
}

#[tokio::test]
async fn slow_origin_times_out_as_network_failure() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(PAGE)
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new()
        .unwrap()
        .with_timeout(Duration::from_millis(200));
    let out = fetcher.fetch(&server.uri()).await;
    assert!(matches!(out, FetchOutcome::NetworkFailure { .. }), "{out:?}");
}

#[tokio::test]
async fn each_fetch_is_a_single_request() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let _ = HttpFetcher::new().unwrap().fetch(&server.uri()).await;
    // `expect(1)` is verified when the server drops.
}
