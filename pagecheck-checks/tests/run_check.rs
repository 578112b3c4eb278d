mod common;

use async_trait::async_trait;
use common::{fresh_repo, init_test_tracing, refused_url, seed_site, SAMPLE_PAGE};
use pagecheck_checks::{CheckError, CheckService, FailureKind, NoticeLevel};
use pagecheck_http::{FetchOutcome, HttpFetcher, PageFetcher};
use tempfile::TempDir;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

struct CannedFetcher(FetchOutcome);

#[async_trait]
impl PageFetcher for CannedFetcher {
    async fn fetch(&self, _url: &str) -> FetchOutcome {
        self.0.clone()
    }
}

async fn serve(status: u16, body: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn successful_fetch_appends_one_check() {
    init_test_tracing();
    let tmp = TempDir::new().unwrap();
    let repo = fresh_repo(&tmp).await;
    let server = serve(200, SAMPLE_PAGE).await;
    let site = seed_site(&repo, &server.uri()).await;

    let service = CheckService::new(repo.clone(), HttpFetcher::new().unwrap());
    let report = service.run_check(site.id).await.expect("check recorded");

    assert_eq!(report.check.site_id, site.id);
    assert_eq!(report.check.status_code, Some(200));
    assert_eq!(report.check.h1.as_deref(), Some("H"));
    assert_eq!(report.check.title.as_deref(), Some("T"));
    assert_eq!(report.check.description.as_deref(), Some("D"));
    assert_eq!(report.notice().level, NoticeLevel::Success);

    let checks = repo.list_checks_for_site(site.id).await.unwrap();
    assert_eq!(checks.len(), 1);
    assert_eq!(checks[0].id, report.check.id);
    assert_eq!(checks[0].h1, report.check.h1);
    assert_eq!(checks[0].title, report.check.title);
    assert_eq!(checks[0].description, report.check.description);
}

#[tokio::test]
async fn refused_connection_writes_nothing() {
    init_test_tracing();
    let tmp = TempDir::new().unwrap();
    let repo = fresh_repo(&tmp).await;
    let site = seed_site(&repo, &refused_url()).await;
    let service = CheckService::new(repo.clone(), HttpFetcher::new().unwrap());

    let before = repo.count_checks(site.id).await.unwrap();
    let err = service.run_check(site.id).await.unwrap_err();
    let after = repo.count_checks(site.id).await.unwrap();

    assert_eq!(before, after);
    match &err {
        CheckError::FetchFailed { site_id, kind, reason } => {
            assert_eq!(*site_id, site.id);
            assert_eq!(*kind, FailureKind::Network);
            assert!(!reason.is_empty());
        }
        other => panic!("expected fetch failure, got {other:?}"),
    }
    let notice = err.notice();
    assert_eq!(notice.level, NoticeLevel::Danger);
    assert!(notice.message.starts_with("Check failed with error: "));
}

#[tokio::test]
async fn other_failures_also_write_nothing() {
    init_test_tracing();
    let tmp = TempDir::new().unwrap();
    let repo = fresh_repo(&tmp).await;
    let site = seed_site(&repo, "https://example.com").await;
    let service = CheckService::new(
        repo.clone(),
        CannedFetcher(FetchOutcome::OtherFailure {
            reason: "too many redirects".into(),
        }),
    );

    let err = service.run_check(site.id).await.unwrap_err();
    assert!(matches!(
        err,
        CheckError::FetchFailed {
            kind: FailureKind::Other,
            ..
        }
    ));
    assert_eq!(repo.count_checks(site.id).await.unwrap(), 0);
}

#[tokio::test]
async fn error_statuses_are_recorded() {
    init_test_tracing();
    let tmp = TempDir::new().unwrap();
    let repo = fresh_repo(&tmp).await;
    let server = serve(500, "<title>Oops</title>").await;
    let site = seed_site(&repo, &server.uri()).await;
    let service = CheckService::new(repo.clone(), HttpFetcher::new().unwrap());

    let report = service.run_check(site.id).await.unwrap();
    assert_eq!(report.check.status_code, Some(500));
    assert_eq!(report.check.title.as_deref(), Some("Oops"));
    assert_eq!(report.check.h1, None);
    assert_eq!(report.check.description, None);
}

#[tokio::test]
async fn unknown_site_is_not_found() {
    init_test_tracing();
    let tmp = TempDir::new().unwrap();
    let repo = fresh_repo(&tmp).await;
    let service = CheckService::new(
        repo,
        CannedFetcher(FetchOutcome::Success {
            status_code: 200,
            body: SAMPLE_PAGE.into(),
        }),
    );

    let err = service.run_check(404).await.unwrap_err();
    assert!(matches!(err, CheckError::SiteNotFound(404)));
}

#[tokio::test]
async fn long_headings_are_stored_truncated() {
    init_test_tracing();
    let tmp = TempDir::new().unwrap();
    let repo = fresh_repo(&tmp).await;
    let site = seed_site(&repo, "https://example.com").await;
    let long = "h".repeat(1000);
    let body = format!(
        r#"<title>{long}</title><meta name="description" content="{long}"><h1>{long}</h1>"#
    );
    let service = CheckService::new(
        repo.clone(),
        CannedFetcher(FetchOutcome::Success {
            status_code: 200,
            body,
        }),
    );

    service.run_check(site.id).await.unwrap();
    let stored = &repo.list_checks_for_site(site.id).await.unwrap()[0];
    assert_eq!(stored.h1.as_ref().map(|s| s.chars().count()), Some(255));
    assert_eq!(stored.title.as_ref().map(|s| s.chars().count()), Some(255));
    assert_eq!(stored.description.as_ref().map(|s| s.len()), Some(1000));
}

#[tokio::test]
async fn repeated_checks_accumulate_and_latest_wins() {
    init_test_tracing();
    let tmp = TempDir::new().unwrap();
    let repo = fresh_repo(&tmp).await;
    let server = serve(200, SAMPLE_PAGE).await;
    let site = seed_site(&repo, &server.uri()).await;
    let service = CheckService::new(repo.clone(), HttpFetcher::new().unwrap());

    let (a, b) = tokio::join!(service.run_check(site.id), service.run_check(site.id));
    let a = a.unwrap();
    let b = b.unwrap();
    assert_ne!(a.check.id, b.check.id);

    let listing = repo.list_all_with_latest_check().await.unwrap();
    let latest = listing[0].latest_check.as_ref().unwrap();
    assert_eq!(latest.id, a.check.id.max(b.check.id));
    assert_eq!(repo.count_checks(site.id).await.unwrap(), 2);
}
