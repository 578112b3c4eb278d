use crate::notice::Notice;
use pagecheck_store::{SiteId, StoreError};
use pagecheck_web::UrlError;
use serde::Serialize;
use thiserror::Error;

pub const INVALID_URL_MESSAGE: &str = "Invalid URL";

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error(transparent)]
    Url(#[from] UrlError),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl RegisterError {
    /// Parsed-but-incomplete input: send the user home, no field error.
    pub fn is_soft(&self) -> bool {
        matches!(self, RegisterError::Url(e) if e.is_soft())
    }

    /// Message for the URL input field, if this is a validation failure.
    pub fn field_error(&self) -> Option<&'static str> {
        match self {
            RegisterError::Url(e) if !e.is_soft() => Some(INVALID_URL_MESSAGE),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    Network,
    Other,
}

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("site {0} not found")]
    SiteNotFound(SiteId),
    /// The page could not be fetched. Nothing was written.
    #[error("Check failed with error: {reason}")]
    FetchFailed {
        site_id: SiteId,
        kind: FailureKind,
        reason: String,
    },
    #[error(transparent)]
    Storage(StoreError),
}

impl From<StoreError> for CheckError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SiteNotFound(id) => CheckError::SiteNotFound(id),
            other => CheckError::Storage(other),
        }
    }
}

impl CheckError {
    pub fn notice(&self) -> Notice {
        match self {
            CheckError::SiteNotFound(_) => Notice::danger("Page not found"),
            other => Notice::danger(other.to_string()),
        }
    }

    /// Transient failures the user can simply retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, CheckError::FetchFailed { .. })
    }
}
