#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident extraction and multi-source aggregation.
//!
//! [`Aggregator`] fetches every URL, extracts every uploaded PDF, and merges
//! the resulting rows into one [`IngestOutcome`]. Inputs are processed one
//! at a time; a failing input is logged, recorded as a user-facing message
//! and skipped. The batch only fails when no incidents were found at all.

pub mod extract;
pub mod progress;

use std::sync::Arc;

use incident_lens_incident_models::RawIncident;
use incident_lens_scraper::{FetchError, Fetcher};

pub use incident_lens_ingest_models::{IngestOutcome, UploadedFile};

use crate::extract::{ExtractError, extract_off_thread};
use crate::progress::{ProgressCallback, null_progress};

/// Lead-in sentence of the empty-result message.
pub const NO_INCIDENTS_MESSAGE: &str = "No incidents were found or the input provided is invalid.";

/// Errors that fail a whole aggregation run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IngestError {
    /// No input produced any incidents. Carries the per-input failures.
    #[error("{}", no_incidents_message(.errors))]
    NoIncidents {
        /// One message per failed input.
        errors: Vec<String>,
    },
}

fn no_incidents_message(errors: &[String]) -> String {
    if errors.is_empty() {
        NO_INCIDENTS_MESSAGE.to_owned()
    } else {
        format!("{NO_INCIDENTS_MESSAGE} Errors: {}", errors.join("; "))
    }
}

/// Failure of a single URL, before it is turned into a message.
#[derive(Debug, thiserror::Error)]
enum SourceError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// Formats the user-facing message for a failed URL.
fn url_error_message(url: &str, err: &SourceError) -> String {
    match err {
        SourceError::Fetch(FetchError::Status { status, .. }) => {
            format!("HTTP Error {status} for URL: {url}")
        }
        SourceError::Fetch(FetchError::Transport { reason, .. }) => {
            format!("URL Error for URL: {url} - {reason}")
        }
        other => format!("Failed to fetch from URL: {url} - {other}"),
    }
}

/// Formats the user-facing message for a failed upload.
fn file_error_message(filename: &str, err: &ExtractError) -> String {
    format!("Failed to process file: {filename} - {err}")
}

/// Splits a free-text URL field on whitespace.
#[must_use]
pub fn split_urls(input: &str) -> Vec<String> {
    input.split_whitespace().map(str::to_owned).collect()
}

/// Merges incidents from URLs and uploaded files.
pub struct Aggregator<'a, F: Fetcher + ?Sized> {
    fetcher: &'a F,
    progress: Arc<dyn ProgressCallback>,
}

impl<'a, F: Fetcher + ?Sized> Aggregator<'a, F> {
    /// Creates an aggregator with no progress reporting.
    #[must_use]
    pub fn new(fetcher: &'a F) -> Self {
        Self {
            fetcher,
            progress: null_progress(),
        }
    }

    /// Reports progress (one step per processed input) to `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    /// Processes all URLs, then all PDF uploads, in order.
    ///
    /// Files without a `.pdf` extension are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::NoIncidents`] if no input produced a single
    /// incident.
    pub async fn run(
        &self,
        urls: &[String],
        files: &[UploadedFile],
    ) -> Result<IngestOutcome, IngestError> {
        let pdfs: Vec<&UploadedFile> = files.iter().filter(|f| f.is_pdf()).collect();
        let skipped = files.len() - pdfs.len();
        if skipped > 0 {
            log::debug!("Ignoring {skipped} non-PDF upload(s)");
        }

        self.progress.set_total((urls.len() + pdfs.len()) as u64);

        let mut outcome = IngestOutcome::default();

        for url in urls {
            self.progress.set_message(format!("Fetching {url}"));

            match self.fetch_url(url).await {
                Ok(rows) => {
                    log::info!("Extracted {} incidents from {url}", rows.len());
                    outcome.incidents.extend(rows);
                }
                Err(e) => {
                    let msg = url_error_message(url, &e);
                    log::warn!("{msg}");
                    outcome.errors.push(msg);
                }
            }

            self.progress.inc(1);
        }

        for file in pdfs {
            self.progress
                .set_message(format!("Extracting {}", file.filename));

            match extract_off_thread(file.bytes.clone()).await {
                Ok(rows) => {
                    log::info!("Extracted {} incidents from {}", rows.len(), file.filename);
                    outcome.incidents.extend(rows);
                }
                Err(e) => {
                    let msg = file_error_message(&file.filename, &e);
                    log::warn!("{msg}");
                    outcome.errors.push(msg);
                }
            }

            self.progress.inc(1);
        }

        self.progress.finish(format!(
            "{} incidents, {} failed input(s)",
            outcome.incidents.len(),
            outcome.errors.len()
        ));

        if outcome.incidents.is_empty() {
            return Err(IngestError::NoIncidents {
                errors: outcome.errors,
            });
        }

        log::info!(
            "Aggregated {} incidents ({} input error(s))",
            outcome.incidents.len(),
            outcome.errors.len()
        );

        Ok(outcome)
    }

    async fn fetch_url(&self, url: &str) -> Result<Vec<RawIncident>, SourceError> {
        let raw = self.fetcher.fetch(url).await?;
        Ok(extract_off_thread(raw).await?)
    }
}

/// Aggregates with default settings.
///
/// # Errors
///
/// Returns [`IngestError::NoIncidents`] if no input produced a single
/// incident.
pub async fn aggregate<F: Fetcher + ?Sized>(
    fetcher: &F,
    urls: &[String],
    files: &[UploadedFile],
) -> Result<IngestOutcome, IngestError> {
    Aggregator::new(fetcher).run(urls, files).await
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::fmt::Write as _;
    use std::sync::Mutex;

    use super::*;

    enum Canned {
        Body(String),
        Status(u16),
        Refused,
    }

    /// Serves canned responses keyed by URL; unknown URLs are refused.
    struct MockFetcher {
        responses: BTreeMap<String, Canned>,
    }

    impl MockFetcher {
        fn new(responses: Vec<(&str, Canned)>) -> Self {
            Self {
                responses: responses
                    .into_iter()
                    .map(|(url, canned)| (url.to_owned(), canned))
                    .collect(),
            }
        }
    }

    impl Fetcher for MockFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            match self.responses.get(url) {
                Some(Canned::Body(body)) => Ok(body.clone().into_bytes()),
                Some(Canned::Status(status)) => Err(FetchError::Status {
                    url: url.to_owned(),
                    status: *status,
                }),
                Some(Canned::Refused) | None => Err(FetchError::Transport {
                    url: url.to_owned(),
                    reason: "Connection refused".to_owned(),
                }),
            }
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        events: Mutex<Vec<String>>,
    }

    impl ProgressCallback for RecordingProgress {
        fn set_total(&self, total: u64) {
            self.events.lock().unwrap().push(format!("total {total}"));
        }
        fn inc(&self, delta: u64) {
            self.events.lock().unwrap().push(format!("inc {delta}"));
        }
        fn set_message(&self, _msg: String) {}
        fn finish(&self, _msg: String) {
            self.events.lock().unwrap().push("finish".to_owned());
        }
    }

    fn listing(natures: &[&str]) -> String {
        let mut html = String::from(
            "<table><thead><tr><th>Date / Time</th><th>Nature</th></tr></thead><tbody>",
        );
        for (i, nature) in natures.iter().enumerate() {
            write!(html, "<tr><td>12/4/2024 {i}:00</td><td>{nature}</td></tr>").unwrap();
        }
        html.push_str("</tbody></table>");
        html
    }

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_owned()).collect()
    }

    #[tokio::test]
    async fn no_inputs_is_the_empty_result_failure() {
        let fetcher = MockFetcher::new(vec![]);
        let err = aggregate(&fetcher, &[], &[]).await.unwrap_err();
        assert_eq!(err.to_string(), NO_INCIDENTS_MESSAGE);
    }

    #[tokio::test]
    async fn partial_failure_keeps_successful_rows() {
        let fetcher = MockFetcher::new(vec![
            (
                "http://up.example/daily",
                Canned::Body(listing(&["Larceny", "Alarm", "Traffic Stop", "Alarm", "Fraud"])),
            ),
            ("http://down.example/daily", Canned::Refused),
        ]);

        let outcome = aggregate(
            &fetcher,
            &urls(&["http://up.example/daily", "http://down.example/daily"]),
            &[],
        )
        .await
        .unwrap();

        assert_eq!(outcome.incidents.len(), 5);
        assert_eq!(
            outcome.errors,
            vec!["URL Error for URL: http://down.example/daily - Connection refused".to_owned()]
        );
    }

    #[tokio::test]
    async fn status_errors_carry_the_code() {
        let fetcher = MockFetcher::new(vec![
            ("http://a.example", Canned::Status(404)),
            ("http://b.example", Canned::Body(listing(&["Alarm"]))),
        ]);

        let outcome = aggregate(&fetcher, &urls(&["http://a.example", "http://b.example"]), &[])
            .await
            .unwrap();

        assert_eq!(outcome.errors, vec!["HTTP Error 404 for URL: http://a.example"]);
    }

    #[tokio::test]
    async fn extraction_failure_uses_generic_url_message() {
        let fetcher = MockFetcher::new(vec![(
            "http://blank.example",
            Canned::Body("<p>nothing</p>".to_owned()),
        )]);

        let err = aggregate(&fetcher, &urls(&["http://blank.example"]), &[])
            .await
            .unwrap_err();

        let IngestError::NoIncidents { errors } = &err;
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Failed to fetch from URL: http://blank.example - "));
    }

    #[tokio::test]
    async fn all_failures_are_consolidated() {
        let fetcher = MockFetcher::new(vec![("http://a.example", Canned::Status(500))]);
        let files = vec![UploadedFile::new("summary.pdf", b"%PDF-1.4 broken".to_vec())];

        let err = aggregate(&fetcher, &urls(&["http://a.example"]), &files)
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.starts_with(&format!(
            "{NO_INCIDENTS_MESSAGE} Errors: HTTP Error 500 for URL: http://a.example; \
             Failed to process file: summary.pdf - "
        )));
    }

    #[tokio::test]
    async fn non_pdf_uploads_are_ignored() {
        let fetcher = MockFetcher::new(vec![("http://b.example", Canned::Body(listing(&["Alarm"])))]);
        let files = vec![UploadedFile::new("notes.txt", b"%PDF-1.4 broken".to_vec())];

        let outcome = aggregate(&fetcher, &urls(&["http://b.example"]), &files)
            .await
            .unwrap();

        assert_eq!(outcome.incidents.len(), 1);
        assert!(outcome.errors.is_empty());
    }

    #[tokio::test]
    async fn rows_keep_input_order() {
        let fetcher = MockFetcher::new(vec![
            ("http://1.example", Canned::Body(listing(&["First", "Second"]))),
            ("http://2.example", Canned::Body(listing(&["Third"]))),
        ]);

        let outcome = aggregate(&fetcher, &urls(&["http://1.example", "http://2.example"]), &[])
            .await
            .unwrap();

        let natures: Vec<_> = outcome.incidents.iter().filter_map(RawIncident::nature).collect();
        assert_eq!(natures, vec!["First", "Second", "Third"]);
    }

    #[tokio::test]
    async fn progress_counts_each_processed_input() {
        let fetcher = MockFetcher::new(vec![("http://b.example", Canned::Body(listing(&["Alarm"])))]);
        let progress = Arc::new(RecordingProgress::default());
        let files = vec![
            UploadedFile::new("a.pdf", b"%PDF-1.4 broken".to_vec()),
            UploadedFile::new("b.csv", Vec::new()),
        ];

        Aggregator::new(&fetcher)
            .with_progress(progress.clone())
            .run(&urls(&["http://b.example"]), &files)
            .await
            .unwrap();

        let events = progress.events.lock().unwrap().clone();
        assert_eq!(events, vec!["total 2", "inc 1", "inc 1", "finish"]);
    }

    #[test]
    fn splits_urls_on_any_whitespace() {
        assert_eq!(
            split_urls(" http://a.example\nhttp://b.example\t http://c.example "),
            vec!["http://a.example", "http://b.example", "http://c.example"]
        );
        assert!(split_urls("   ").is_empty());
    }
}
