#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the incident lens server.
//!
//! These types are serialized to JSON for the REST API. The incident
//! collection returned by `/api/incidents` is sent back unchanged to
//! `/api/analyze`; the server keeps no session.

use chrono::{DateTime, Utc};
use incident_lens_analytics_models::AnalysisSummary;
use incident_lens_chart::ChartSet;
use incident_lens_incident_models::RawIncident;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// Error body for every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// User-facing message.
    pub error: String,
}

impl ApiError {
    /// Wraps a message.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// URLs as a JSON list or as one whitespace-separated string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UrlList {
    /// `["https://a", "https://b"]`
    List(Vec<String>),
    /// `"https://a https://b"`
    Text(String),
}

impl Default for UrlList {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl UrlList {
    /// The individual URLs, blanks removed.
    #[must_use]
    pub fn into_urls(self) -> Vec<String> {
        match self {
            Self::List(urls) => urls
                .into_iter()
                .map(|u| u.trim().to_owned())
                .filter(|u| !u.is_empty())
                .collect(),
            Self::Text(text) => text.split_whitespace().map(str::to_owned).collect(),
        }
    }
}

/// Body of `POST /api/incidents`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestRequest {
    /// Pages or PDFs to fetch.
    pub urls: UrlList,
}

/// Response of both ingest endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    /// Every extracted row, in input order.
    pub incidents: Vec<RawIncident>,
    /// One message per input that failed.
    pub errors: Vec<String>,
}

/// Body of `POST /api/analyze`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzeRequest {
    /// The collection returned by an ingest endpoint.
    pub incidents: Vec<RawIncident>,
}

/// Response of `POST /api/analyze`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    /// The rendered charts.
    pub charts: ChartSet,
    /// Headline numbers.
    pub summary: AnalysisSummary,
}

/// Body of `POST /api/feedback`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackRequest {
    /// Free-text feedback.
    pub feedback: String,
}

/// Response of `POST /api/feedback`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackResponse {
    /// Whether the feedback was recorded.
    pub submitted: bool,
}

/// One line of the feedback file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FeedbackEntry {
    /// Entry id.
    pub id: Uuid,
    /// When the server received it.
    pub received_at: DateTime<Utc>,
    /// The feedback text.
    pub feedback: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_accept_a_list() {
        let req: IngestRequest =
            serde_json::from_str(r#"{ "urls": ["https://a.test/x.pdf", " ", "https://b.test"] }"#)
                .unwrap();
        assert_eq!(
            req.urls.into_urls(),
            vec!["https://a.test/x.pdf", "https://b.test"]
        );
    }

    #[test]
    fn urls_accept_a_string() {
        let req: IngestRequest =
            serde_json::from_str(r#"{ "urls": "https://a.test\n  https://b.test " }"#).unwrap();
        assert_eq!(req.urls.into_urls(), vec!["https://a.test", "https://b.test"]);
    }

    #[test]
    fn missing_urls_is_empty() {
        let req: IngestRequest = serde_json::from_str("{}").unwrap();
        assert!(req.urls.into_urls().is_empty());
    }

    #[test]
    fn analyze_request_reads_raw_rows() {
        let req: AnalyzeRequest = serde_json::from_str(
            r#"{ "incidents": [{ "Date Time": "12/4/2024 0:04", "Nature": "Alarm" }] }"#,
        )
        .unwrap();
        assert_eq!(req.incidents[0].nature(), Some("Alarm"));
    }
}
