//! HTTP client construction and shared fetch helpers
//!
//! All adapters share one reqwest client carrying the configured user
//! agent and timeouts. Fetch failures are classified into the two kinds
//! the pipeline distinguishes: transient (routed to the retry
//! coordinator) and malformed (skipped and counted).

use crate::config::CrawlerConfig;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// A failed fetch or parse of one page
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-layer failure; the URL is queued for retry
    #[error("transient network error for {url}: {message}")]
    Transient { url: String, message: String },

    /// The response was fetched but cannot be interpreted
    #[error("malformed response from {url}: {message}")]
    Malformed { url: String, message: String },
}

impl FetchError {
    /// The URL the failure occurred on
    pub fn url(&self) -> &str {
        match self {
            Self::Transient { url, .. } => url,
            Self::Malformed { url, .. } => url,
        }
    }
}

/// Builds the HTTP client shared by all adapters
///
/// Timeouts are deliberate: the per-request timeout is distinct from the
/// inter-request pacing sleep.
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and returns the response body as text
///
/// Non-success status codes and network errors both classify as
/// transient; the caller decides whether to queue the URL for retry.
pub async fn fetch_text(client: &Client, url: &str) -> Result<String, FetchError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| classify_reqwest_error(url, &e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Transient {
            url: url.to_string(),
            message: format!("HTTP {}", status),
        });
    }

    response.text().await.map_err(|e| FetchError::Transient {
        url: url.to_string(),
        message: e.to_string(),
    })
}

fn classify_reqwest_error(url: &str, error: &reqwest::Error) -> FetchError {
    let message = if error.is_timeout() {
        "request timeout".to_string()
    } else if error.is_connect() {
        "connection failed".to_string()
    } else {
        error.to_string()
    };

    FetchError::Transient {
        url: url.to_string(),
        message,
    }
}
