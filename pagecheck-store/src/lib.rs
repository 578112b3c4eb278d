//! SQLite-backed persistence for sites and their check history.
//!
//! Two tables: `sites` (one row per normalized URL, enforced by a UNIQUE
//! constraint) and `checks` (append-only, foreign key to `sites`). Nothing is
//! ever updated or deleted. [`SiteRepository`] is the only writer.
//!
//! Concurrency: registrations of the same URL may race. The storage constraint
//! decides the winner and the loser re-reads the row, so no in-process locking
//! is involved. The pool uses WAL and a busy timeout so concurrent writers wait
//! on each other instead of failing with `database is locked`.
use pagecheck_config::DatabaseConfig;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

mod model;
mod repository;

pub use model::{Check, NewCheck, Site, SiteId, SiteWithLatestCheck};
pub use repository::SiteRepository;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS sites (
        id             INTEGER PRIMARY KEY AUTOINCREMENT,
        normalized_url TEXT NOT NULL UNIQUE,
        created_at     TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS checks (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        site_id     INTEGER NOT NULL REFERENCES sites(id),
        status_code INTEGER,
        h1          TEXT,
        title       TEXT,
        description TEXT,
        created_at  TEXT NOT NULL
    )"#,
    r#"CREATE INDEX IF NOT EXISTS idx_checks_site_id ON checks (site_id, id)"#,
];

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("site {0} not found")]
    SiteNotFound(SiteId),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Open (creating if needed) the database named by `cfg.url`.
///
/// `sqlite::memory:` gives every pooled connection its own empty database;
/// use a file URL when more than one connection is configured.
pub async fn connect(cfg: &DatabaseConfig) -> Result<SqlitePool, StoreError> {
    let opts = SqliteConnectOptions::from_str(&cfg.url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(cfg.max_connections.max(1))
        .connect_with(opts)
        .await?;
    info!(
        url = %cfg.url,
        max_connections = cfg.max_connections,
        "store.connected"
    );
    Ok(pool)
}

/// Create the tables and index if they are missing. Safe to run on every start.
pub async fn migrate(pool: &SqlitePool) -> Result<(), StoreError> {
    for stmt in SCHEMA {
        sqlx::query(stmt).execute(pool).await?;
    }
    info!(statements = SCHEMA.len(), "store.migrated");
    Ok(())
}
