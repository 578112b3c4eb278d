//! Single-shot page fetcher used by checks.
//!
//! - One GET per call, no retries, bounded by a request timeout (5s default)
//! - Any completed HTTP exchange is a [`FetchOutcome::Success`], whatever the
//!   status code; the status is what gets recorded
//! - Transport problems (connect, timeout, broken body) become
//!   [`FetchOutcome::NetworkFailure`]; everything else
//!   [`FetchOutcome::OtherFailure`]. `fetch` itself never errors.
//!
//! TLS certificate chains are not validated by default (`accept_invalid_certs`).
//!
//! Observability: `fetch.start`, `fetch.success`, `fetch.network_failure` and
//! `fetch.other_failure` events carry `req_id`, `url` and `duration_ms`.

use async_trait::async_trait;
use pagecheck_config::FetchConfig;
use reqwest::redirect::Policy;
use reqwest::Client;
use serde::Serialize;
use std::error::Error as StdError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;

static REQ_SEQ: AtomicU64 = AtomicU64::new(0);

// ==============================
// Outcome
// ==============================

/// Result of one fetch attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FetchOutcome {
    Success { status_code: u16, body: String },
    NetworkFailure { reason: String },
    OtherFailure { reason: String },
}

/// Seam between the check orchestrator and the network.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchOutcome;
}

// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("client build failed: {0}")]
    Build(String),
}

// ==============================
// Client
// ==============================

#[derive(Clone)]
pub struct HttpFetcher {
    inner: Client,
    pub timeout: Duration,
    accept_invalid_certs: bool,
}

impl HttpFetcher {
    /// Build a fetcher with the stock settings (5s timeout, relaxed TLS).
    ///
    /// ```no_run
    /// use pagecheck_http::{HttpError, HttpFetcher};
    /// use std::time::Duration;
    ///
    /// let fetcher = HttpFetcher::new()?;
    /// assert_eq!(fetcher.timeout, Duration::from_secs(5));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new() -> Result<Self, HttpError> {
        Self::from_config(&FetchConfig::default())
    }

    pub fn from_config(cfg: &FetchConfig) -> Result<Self, HttpError> {
        let inner = Client::builder()
            .user_agent(cfg.user_agent.as_str())
            .connect_timeout(cfg.connect_timeout())
            .redirect(Policy::limited(cfg.max_redirects))
            .danger_accept_invalid_certs(cfg.accept_invalid_certs)
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            inner,
            timeout: cfg.timeout(),
            accept_invalid_certs: cfg.accept_invalid_certs,
        })
    }

    /// Whether the client was built to skip certificate validation.
    pub fn accepts_invalid_certs(&self) -> bool {
        self.accept_invalid_certs
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.timeout = dur;
        self
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        let req_id = format!("f{:x}", REQ_SEQ.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(
            req_id = %req_id,
            url,
            timeout_ms = self.timeout.as_millis() as u64,
            "fetch.start"
        );

        let t0 = Instant::now();
        let resp = match self.inner.get(url).timeout(self.timeout).send().await {
            Ok(resp) => resp,
            Err(err) => return failure(&req_id, url, t0, &err),
        };

        let status = resp.status();
        let body = match resp.text().await {
            Ok(body) => body,
            Err(err) => return failure(&req_id, url, t0, &err),
        };

        tracing::info!(
            req_id = %req_id,
            url,
            %status,
            body_len = body.len(),
            duration_ms = t0.elapsed().as_millis() as u64,
            "fetch.success"
        );
        FetchOutcome::Success {
            status_code: status.as_u16(),
            body,
        }
    }
}

// ==============================
// Helpers
// ==============================

fn failure(req_id: &str, url: &str, t0: Instant, err: &reqwest::Error) -> FetchOutcome {
    let reason = error_chain(err);
    let duration_ms = t0.elapsed().as_millis() as u64;
    if is_network_error(err) {
        tracing::warn!(req_id, url, duration_ms, reason = %reason, "fetch.network_failure");
        FetchOutcome::NetworkFailure { reason }
    } else {
        tracing::warn!(req_id, url, duration_ms, reason = %reason, "fetch.other_failure");
        FetchOutcome::OtherFailure { reason }
    }
}

fn is_network_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request() || err.is_body()
}

/// `reqwest` hides the useful part (refused, dns, tls) in the source chain.
fn error_chain(err: &reqwest::Error) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        let text = inner.to_string();
        if !msg.contains(&text) {
            msg.push_str(": ");
            msg.push_str(&text);
        }
        source = inner.source();
    }
    msg
}
