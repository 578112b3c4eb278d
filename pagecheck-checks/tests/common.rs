#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::OnceLock;

use chrono::Utc;
use pagecheck_common::observability::{init_logging, LogConfig};
use pagecheck_config::DatabaseConfig;
use pagecheck_store::{connect, migrate, Site, SiteRepository};
use tempfile::TempDir;

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

pub const SAMPLE_PAGE: &str = r#"<html><head><title>T</title><meta name="description" content="D"></head><body><h1>H</h1></body></html>"#;

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "pagecheck-tests".into(),
            log_dir: Some(std::env::temp_dir().join("pagecheck-tests")),
            emit_stderr: true,
            default_filter: "debug".into(),
            ..LogConfig::default()
        };
        init_logging(config).unwrap_or_default()
    });
}

pub async fn fresh_repo(tmp: &TempDir) -> SiteRepository {
    let cfg = DatabaseConfig {
        url: format!("sqlite://{}", tmp.path().join("checks.db").display()),
        max_connections: 4,
    };
    let pool = connect(&cfg).await.expect("connect");
    migrate(&pool).await.expect("migrate");
    SiteRepository::new(pool)
}

/// Insert a site whose stored URL keeps its port, so it can point at a mock
/// server. Registration would strip the port.
pub async fn seed_site(repo: &SiteRepository, url: &str) -> Site {
    let created_at = Utc::now();
    let done = sqlx::query("INSERT INTO sites (normalized_url, created_at) VALUES (?1, ?2)")
        .bind(url)
        .bind(created_at)
        .execute(repo.pool())
        .await
        .expect("seed site");
    Site {
        id: done.last_insert_rowid(),
        normalized_url: url.to_string(),
        created_at,
    }
}

/// A localhost URL nothing is listening on.
pub fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}
