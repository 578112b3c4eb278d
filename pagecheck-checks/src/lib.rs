//! Registration and check orchestration.
//!
//! [`CheckService`] wires the canonicalizer, repository, fetcher and extractor
//! together. It holds no state of its own beyond the injected collaborators,
//! so one instance serves every request.
//!
//! `run_check` writes exactly one row on success and nothing on any failure:
//! a failed fetch comes back as [`CheckError::FetchFailed`] with the reason,
//! never as a partial check.

mod error;
mod notice;

pub use error::{CheckError, FailureKind, RegisterError, INVALID_URL_MESSAGE};
pub use notice::{Notice, NoticeLevel};

use pagecheck_http::{FetchOutcome, PageFetcher};
use pagecheck_store::{Check, NewCheck, Site, SiteId, SiteRepository};
use pagecheck_web::{canonicalize, extract};
use serde::Serialize;
use tracing::{info, warn};

/// Result of a register submission.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub site: Site,
    /// `false` when the URL was already registered.
    pub created: bool,
}

impl Registration {
    pub fn notice(&self) -> Notice {
        if self.created {
            Notice::success("Page successfully added")
        } else {
            Notice::info("Page already exists")
        }
    }
}

/// Result of a successful check run.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub check: Check,
}

impl CheckReport {
    pub fn notice(&self) -> Notice {
        Notice::success("Page successfully checked")
    }
}

pub struct CheckService<F> {
    repo: SiteRepository,
    fetcher: F,
}

impl<F: PageFetcher> CheckService<F> {
    pub fn new(repo: SiteRepository, fetcher: F) -> Self {
        Self { repo, fetcher }
    }

    pub fn repository(&self) -> &SiteRepository {
        &self.repo
    }

    /// Canonicalize `input` and create-or-find its site.
    pub async fn register(&self, input: &str) -> Result<Registration, RegisterError> {
        let url = canonicalize(input).inspect_err(|err| {
            info!(input, error = %err, soft = err.is_soft(), "checks.register.rejected");
        })?;
        let (site, created) = self.repo.find_or_create(&url).await?;
        info!(site_id = site.id, url = %url, created, "checks.register");
        Ok(Registration { site, created })
    }

    /// Fetch the site's page, extract its signals and append a check.
    pub async fn run_check(&self, site_id: SiteId) -> Result<CheckReport, CheckError> {
        let site = self.repo.get_by_id(site_id).await?;

        let (status_code, body) = match self.fetcher.fetch(&site.normalized_url).await {
            FetchOutcome::Success { status_code, body } => (status_code, body),
            FetchOutcome::NetworkFailure { reason } => {
                return Err(fetch_failed(&site, FailureKind::Network, reason));
            }
            FetchOutcome::OtherFailure { reason } => {
                return Err(fetch_failed(&site, FailureKind::Other, reason));
            }
        };

        let content = extract(&body);
        let check = self
            .repo
            .append_check(
                site.id,
                NewCheck {
                    status_code: Some(status_code),
                    h1: content.h1,
                    title: content.title,
                    description: content.description,
                },
            )
            .await?;
        info!(
            site_id = site.id,
            check_id = check.id,
            status_code,
            "checks.run_check.recorded"
        );
        Ok(CheckReport { check })
    }
}

fn fetch_failed(site: &Site, kind: FailureKind, reason: String) -> CheckError {
    warn!(
        site_id = site.id,
        url = %site.normalized_url,
        kind = ?kind,
        reason = %reason,
        "checks.run_check.fetch_failed"
    );
    CheckError::FetchFailed {
        site_id: site.id,
        kind,
        reason,
    }
}
