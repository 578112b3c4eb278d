use chrono::{DateTime, Utc};
use serde::Serialize;

pub type SiteId = i64;

/// A registered, deduplicated target URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Site {
    pub id: SiteId,
    /// Canonical `scheme://host`, unique across sites.
    pub normalized_url: String,
    pub created_at: DateTime<Utc>,
}

/// One immutable fetch-and-extract record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Check {
    pub id: i64,
    pub site_id: SiteId,
    /// Absent when the row predates a completed fetch; always set by `run_check`.
    pub status_code: Option<u16>,
    pub h1: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Payload for [`crate::SiteRepository::append_check`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewCheck {
    pub status_code: Option<u16>,
    pub h1: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteWithLatestCheck {
    pub site: Site,
    pub latest_check: Option<Check>,
}
