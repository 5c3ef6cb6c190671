#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Ingestion inputs and result types.

use incident_lens_incident_models::RawIncident;
use serde::{Deserialize, Serialize};

/// A document supplied directly by the user rather than fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Original file name, used for type filtering and error messages.
    pub filename: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// Creates an uploaded file.
    #[must_use]
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    /// Returns `true` if the file name has a `.pdf` extension
    /// (case-insensitive). Only PDFs are processed.
    #[must_use]
    pub fn is_pdf(&self) -> bool {
        std::path::Path::new(&self.filename)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
    }
}

/// Result of a successful aggregation.
///
/// `errors` lists the inputs that failed; their failure did not stop the
/// batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestOutcome {
    /// All extracted rows, in input order.
    pub incidents: Vec<RawIncident>,
    /// One message per failed input.
    pub errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_extension_check_is_case_insensitive() {
        assert!(UploadedFile::new("summary.pdf", Vec::new()).is_pdf());
        assert!(UploadedFile::new("2024-12-04_SUMMARY.PDF", Vec::new()).is_pdf());
        assert!(!UploadedFile::new("summary.pdf.txt", Vec::new()).is_pdf());
        assert!(!UploadedFile::new("pdf", Vec::new()).is_pdf());
    }

    #[test]
    fn outcome_serializes_camel_case() {
        let outcome = IngestOutcome {
            incidents: vec![RawIncident::new().with("Nature", "Alarm")],
            errors: vec!["HTTP Error 404 for URL: http://x".to_owned()],
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["incidents"][0]["Nature"], "Alarm");
        assert_eq!(json["errors"][0], "HTTP Error 404 for URL: http://x");
    }
}
