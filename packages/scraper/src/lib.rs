#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident report fetching and HTML table extraction.
//!
//! Provides the [`Fetcher`] trait, its HTTP implementation
//! [`HttpFetcher`], and [`html_table`] for turning an incident listing page
//! into [`incident_lens_incident_models::RawIncident`] rows.
//!
//! Fetch failures are classified into transport, status and other errors
//! ([`FetchError`]) so callers can report each class differently.

pub mod html_table;

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Browser-like agent; some police portals reject default client agents.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Errors that can occur while fetching a URL.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The host could not be reached (DNS, refused connection, timeout).
    #[error("transport error for {url}: {reason}")]
    Transport {
        /// The URL being fetched.
        url: String,
        /// Underlying cause.
        reason: String,
    },

    /// The server answered with a non-success status.
    #[error("HTTP {status} for {url}")]
    Status {
        /// The URL being fetched.
        url: String,
        /// Numeric HTTP status code.
        status: u16,
    },

    /// Any other failure (malformed URL, body read, ...).
    #[error("{message}")]
    Other {
        /// The URL being fetched.
        url: String,
        /// Description of the failure.
        message: String,
    },

    /// The HTTP client could not be configured.
    #[error("HTTP client setup failed: {0}")]
    Client(String),
}

/// Errors that can occur while extracting rows from an HTML page.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// The document did not have the expected structure.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// HTTP settings for [`HttpFetcher`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct FetchConfig {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// `User-Agent` header value.
    pub user_agent: String,
    /// Additional HTTP headers to include in requests.
    pub headers: BTreeMap<String, String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            headers: BTreeMap::new(),
        }
    }
}

impl FetchConfig {
    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Sets the `User-Agent` header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        user_agent.clone_into(&mut self.user_agent);
        self
    }

    /// Adds an HTTP header to include in requests.
    #[must_use]
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_owned(), value.to_owned());
        self
    }
}

/// Retrieves the raw content behind a URL.
///
/// The aggregator is generic over this trait so tests can substitute
/// canned responses for the network.
pub trait Fetcher: Send + Sync {
    /// Fetches `url` and returns the response body.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] classified by failure kind.
    fn fetch(
        &self,
        url: &str,
    ) -> impl std::future::Future<Output = Result<Vec<u8>, FetchError>> + Send;
}

/// [`Fetcher`] backed by a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Builds a fetcher from the given settings.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] if a header is invalid or the client
    /// cannot be built.
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let mut header_map = reqwest::header::HeaderMap::new();
        for (key, value) in &config.headers {
            let name = reqwest::header::HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| FetchError::Client(format!("invalid header name '{key}': {e}")))?;
            let val = reqwest::header::HeaderValue::from_str(value)
                .map_err(|e| FetchError::Client(format!("invalid header value '{value}': {e}")))?;
            header_map.insert(name, val);
        }

        let client = reqwest::Client::builder()
            .default_headers(header_map)
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_owned(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| classify(url, &e))?;

        log::debug!("Downloaded {} bytes from {url}", bytes.len());

        Ok(bytes.to_vec())
    }
}

/// Maps a [`reqwest::Error`] onto the [`FetchError`] classes.
fn classify(url: &str, err: &reqwest::Error) -> FetchError {
    if let Some(status) = err.status() {
        return FetchError::Status {
            url: url.to_owned(),
            status: status.as_u16(),
        };
    }

    if err.is_connect() || err.is_timeout() || err.is_request() {
        return FetchError::Transport {
            url: url.to_owned(),
            reason: root_cause(err),
        };
    }

    FetchError::Other {
        url: url.to_owned(),
        message: err.to_string(),
    }
}

/// Returns the innermost message of an error's source chain.
fn root_cause(err: &(dyn std::error::Error + 'static)) -> String {
    let mut current = err;
    while let Some(source) = current.source() {
        current = source;
    }
    current.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_config_builders_apply() {
        let config = FetchConfig::default()
            .with_timeout_secs(5)
            .with_user_agent("incident-lens-test")
            .with_header("Accept", "text/html");

        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.user_agent, "incident-lens-test");
        assert_eq!(config.headers["Accept"], "text/html");
    }

    #[test]
    fn invalid_header_is_a_client_error() {
        let config = FetchConfig::default().with_header("bad header", "x");
        assert!(matches!(
            HttpFetcher::new(&config),
            Err(FetchError::Client(_))
        ));
    }

    #[tokio::test]
    async fn refused_connection_is_a_transport_error() {
        let fetcher = HttpFetcher::new(&FetchConfig::default().with_timeout_secs(5)).unwrap();
        let err = fetcher.fetch("http://127.0.0.1:1/incidents").await.unwrap_err();
        assert!(
            matches!(err, FetchError::Transport { ref url, .. } if url == "http://127.0.0.1:1/incidents"),
            "unexpected error: {err:?}"
        );
    }

    #[tokio::test]
    async fn malformed_url_is_not_a_transport_error() {
        let fetcher = HttpFetcher::new(&FetchConfig::default()).unwrap();
        let err = fetcher.fetch("not a url").await.unwrap_err();
        assert!(matches!(err, FetchError::Other { .. }), "unexpected error: {err:?}");
    }
}
