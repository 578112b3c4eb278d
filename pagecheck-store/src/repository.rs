use crate::model::{Check, NewCheck, Site, SiteId, SiteWithLatestCheck};
use crate::StoreError;
use chrono::{DateTime, Utc};
use pagecheck_common::{clamp_opt, MAX_TEXT_CHARS};
use pagecheck_web::NormalizedUrl;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct SiteRepository {
    pool: SqlitePool,
}

impl SiteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Return the site for `url`, inserting it first if needed.
    ///
    /// The boolean is `true` only for the call that actually inserted the row.
    /// A concurrent insert of the same URL surfaces as a UNIQUE violation and
    /// is resolved by reading the winner's row.
    pub async fn find_or_create(&self, url: &NormalizedUrl) -> Result<(Site, bool), StoreError> {
        if let Some(site) = self.find_by_url(url.as_str()).await? {
            debug!(site_id = site.id, url = %url, "store.find_or_create.existing");
            return Ok((site, false));
        }

        let created_at = Utc::now();
        let res = sqlx::query(r#"INSERT INTO sites (normalized_url, created_at) VALUES (?1, ?2)"#)
            .bind(url.as_str())
            .bind(created_at)
            .execute(&self.pool)
            .await;

        match res {
            Ok(done) => {
                let site = Site {
                    id: done.last_insert_rowid(),
                    normalized_url: url.as_str().to_string(),
                    created_at,
                };
                info!(site_id = site.id, url = %url, "store.find_or_create.created");
                Ok((site, true))
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                warn!(url = %url, "store.find_or_create.lost_race");
                match self.find_by_url(url.as_str()).await? {
                    Some(site) => Ok((site, false)),
                    None => Err(StoreError::Database(sqlx::Error::Database(db_err))),
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn get_by_id(&self, id: SiteId) -> Result<Site, StoreError> {
        let row = sqlx::query(r#"SELECT id, normalized_url, created_at FROM sites WHERE id = ?"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => site_from_row(&row),
            None => {
                debug!(site_id = id, "store.site_missing");
                Err(StoreError::SiteNotFound(id))
            }
        }
    }

    /// All sites, newest first, each with its highest-id check if any.
    pub async fn list_all_with_latest_check(&self) -> Result<Vec<SiteWithLatestCheck>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT
              s.id,
              s.normalized_url,
              s.created_at,
              c.id          AS check_id,
              c.status_code AS check_status_code,
              c.h1          AS check_h1,
              c.title       AS check_title,
              c.description AS check_description,
              c.created_at  AS check_created_at
            FROM sites s
            LEFT JOIN checks c
              ON c.id = (SELECT MAX(id) FROM checks WHERE site_id = s.id)
            ORDER BY s.created_at DESC, s.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        info!(rows = rows.len(), "store.list_all_with_latest_check");

        rows.iter()
            .map(|r| -> Result<SiteWithLatestCheck, StoreError> {
                let site = site_from_row(r)?;
                let latest_check = match r.try_get::<Option<i64>, _>("check_id")? {
                    Some(check_id) => Some(Check {
                        id: check_id,
                        site_id: site.id,
                        status_code: status_from(r.try_get("check_status_code")?),
                        h1: r.try_get("check_h1")?,
                        title: r.try_get("check_title")?,
                        description: r.try_get("check_description")?,
                        created_at: r.try_get::<DateTime<Utc>, _>("check_created_at")?,
                    }),
                    None => None,
                };
                Ok(SiteWithLatestCheck { site, latest_check })
            })
            .collect()
    }

    /// Checks for one site, most recent first.
    ///
    /// An unknown site id yields an empty list; callers that need the
    /// distinction go through [`SiteRepository::get_by_id`] first.
    pub async fn list_checks_for_site(&self, id: SiteId) -> Result<Vec<Check>, StoreError> {
        let rows = sqlx::query(
            r#"SELECT id, site_id, status_code, h1, title, description, created_at
               FROM checks WHERE site_id = ? ORDER BY created_at DESC, id DESC"#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        debug!(site_id = id, rows = rows.len(), "store.list_checks_for_site");

        rows.iter().map(check_from_row).collect()
    }

    pub async fn count_checks(&self, id: SiteId) -> Result<i64, StoreError> {
        let n: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM checks WHERE site_id = ?"#)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    /// Append one check. `h1`/`title` are clamped to 255 characters.
    pub async fn append_check(&self, site_id: SiteId, data: NewCheck) -> Result<Check, StoreError> {
        let created_at = Utc::now();
        let h1 = clamp_opt(data.h1, MAX_TEXT_CHARS);
        let title = clamp_opt(data.title, MAX_TEXT_CHARS);

        let res = sqlx::query(
            r#"INSERT INTO checks (site_id, status_code, h1, title, description, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
        )
        .bind(site_id)
        .bind(data.status_code.map(i64::from))
        .bind(h1.as_deref())
        .bind(title.as_deref())
        .bind(data.description.as_deref())
        .bind(created_at)
        .execute(&self.pool)
        .await;

        let done = match res {
            Ok(done) => done,
            Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
                warn!(site_id, "store.append_check.unknown_site");
                return Err(StoreError::SiteNotFound(site_id));
            }
            Err(err) => return Err(err.into()),
        };

        let check = Check {
            id: done.last_insert_rowid(),
            site_id,
            status_code: data.status_code,
            h1,
            title,
            description: data.description,
            created_at,
        };
        info!(
            site_id,
            check_id = check.id,
            status_code = ?check.status_code,
            "store.append_check"
        );
        Ok(check)
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<Site>, StoreError> {
        let row = sqlx::query(
            r#"SELECT id, normalized_url, created_at FROM sites WHERE normalized_url = ?"#,
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(site_from_row).transpose()
    }
}

fn site_from_row(r: &SqliteRow) -> Result<Site, StoreError> {
    Ok(Site {
        id: r.try_get("id")?,
        normalized_url: r.try_get("normalized_url")?,
        created_at: r.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

fn check_from_row(r: &SqliteRow) -> Result<Check, StoreError> {
    Ok(Check {
        id: r.try_get("id")?,
        site_id: r.try_get("site_id")?,
        status_code: status_from(r.try_get("status_code")?),
        h1: r.try_get("h1")?,
        title: r.try_get("title")?,
        description: r.try_get("description")?,
        created_at: r.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

fn status_from(raw: Option<i64>) -> Option<u16> {
    raw.and_then(|v| u16::try_from(v).ok())
}
