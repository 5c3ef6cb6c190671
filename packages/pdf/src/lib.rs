#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! PDF incident summary extraction.
//!
//! Police departments publish daily incident summaries as PDFs. This crate
//! extracts their text with pure-Rust [`pdf_extract`] and turns it into
//! [`RawIncident`] rows with the daily summary parser ([`summary`]).

pub mod summary;

use incident_lens_incident_models::RawIncident;

/// Errors specific to PDF extraction.
#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    /// PDF text extraction failed.
    #[error("PDF extraction error: {0}")]
    Extraction(String),
}

/// Extracts incident rows from a daily summary PDF.
///
/// # Errors
///
/// Returns [`PdfError`] if the PDF cannot be read.
pub fn extract(bytes: &[u8]) -> Result<Vec<RawIncident>, PdfError> {
    let text = extract_text(bytes)?;
    let records = summary::parse(&text);

    log::info!("Extracted {} incidents from PDF", records.len());

    Ok(records)
}

/// Returns `true` if `bytes` carry the PDF file signature.
#[must_use]
pub fn is_pdf(bytes: &[u8]) -> bool {
    bytes.trim_ascii_start().starts_with(b"%PDF-")
}

/// Extracts the text content of a PDF held in memory.
///
/// The underlying parser can panic on malformed documents; such panics are
/// caught and reported as [`PdfError::Extraction`].
///
/// # Errors
///
/// Returns [`PdfError::Extraction`] if the document cannot be parsed.
pub fn extract_text(bytes: &[u8]) -> Result<String, PdfError> {
    let result = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
        .map_err(|payload| {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_owned())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_owned());
            PdfError::Extraction(format!("PDF parser panicked: {reason}"))
        })?;

    let text = result
        .map_err(|e| PdfError::Extraction(format!("failed to extract text from PDF: {e}")))?;

    log::debug!("Extracted {} characters of text from PDF", text.len());

    Ok(text)
}
