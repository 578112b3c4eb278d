use serde::Serialize;
use std::fmt;
use thiserror::Error;
use url::Url;

/// Longest accepted input, in characters.
pub const MAX_URL_CHARS: usize = 255;

/// Schemes whose URLs must carry a `//` authority.
const AUTHORITY_SCHEMES: [&str; 5] = ["http", "https", "ws", "wss", "ftp"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Invalid URL: empty input")]
    Empty,
    #[error("Invalid URL: {len} characters exceeds the {MAX_URL_CHARS} limit")]
    TooLong { len: usize },
    #[error("Invalid URL: {0}")]
    Malformed(String),
    /// Parsed, but has no scheme or no host. Callers send the user back to the
    /// entry point instead of showing a field error.
    #[error("URL has no scheme or host")]
    Incomplete,
}

impl UrlError {
    /// `true` for the redirect-home case, `false` for field-level rejections.
    pub fn is_soft(&self) -> bool {
        matches!(self, UrlError::Incomplete)
    }
}

/// Canonical `scheme://host` identity of a site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct NormalizedUrl(String);

impl NormalizedUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Validate user input and reduce it to `scheme://host`.
///
/// Emptiness, length and syntax are checked first; only then is the presence
/// of scheme and host required. Path, query, fragment, credentials and port are
/// discarded and scheme/host are lower-cased.
///
/// ```
/// use pagecheck_web::canonicalize;
///
/// let id = canonicalize("https://ExAmple.com/path?x=1").unwrap();
/// assert_eq!(id.as_str(), "https://example.com");
/// ```
pub fn canonicalize(input: &str) -> Result<NormalizedUrl, UrlError> {
    if input.trim().is_empty() {
        return Err(UrlError::Empty);
    }
    let len = input.chars().count();
    if len > MAX_URL_CHARS {
        return Err(UrlError::TooLong { len });
    }

    // `Url::parse` quietly repairs these; reject them as typed.
    if let Some(bad) = input.chars().find(|c| c.is_whitespace() || c.is_control() || *c == '\\') {
        return Err(UrlError::Malformed(format!("unexpected character {bad:?}")));
    }

    let parsed = Url::parse(input).map_err(|e| UrlError::Malformed(e.to_string()))?;

    let scheme = parsed.scheme();
    if AUTHORITY_SCHEMES.contains(&scheme) {
        let after_scheme = input.split_once(':').map_or("", |(_, rest)| rest);
        if !after_scheme.starts_with("//") {
            return Err(UrlError::Malformed(format!("{scheme} URL without `//`")));
        }
    }

    // `example.com.` and `example.com` name the same host.
    let host = match parsed.host_str().map(|h| h.trim_end_matches('.')) {
        Some(h) if !h.is_empty() => h,
        _ => {
            tracing::debug!(input, scheme, "canonical.incomplete");
            return Err(UrlError::Incomplete);
        }
    };

    Ok(NormalizedUrl(format!(
        "{}://{}",
        scheme.to_ascii_lowercase(),
        host.to_ascii_lowercase()
    )))
}
