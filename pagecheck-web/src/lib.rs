//! Pure, network-free pieces of the check pipeline.
//!
//! - URL canonicalization and validation (`canonical`)
//! - Best-effort SEO signal extraction from HTML (`extract`)

pub mod canonical;
pub mod extract;

pub use canonical::{canonicalize, NormalizedUrl, UrlError, MAX_URL_CHARS};
pub use extract::{extract, ExtractedContent};
