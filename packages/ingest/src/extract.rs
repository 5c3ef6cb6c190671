//! Incident extraction from raw documents.
//!
//! PDFs (detected by signature, not by name) go through
//! [`incident_lens_pdf`]; everything else is treated as an HTML page and
//! read with [`incident_lens_scraper::html_table`].

use incident_lens_incident_models::RawIncident;
use incident_lens_pdf::PdfError;
use incident_lens_scraper::ScrapeError;

/// Errors that can occur while extracting incidents from a document.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The PDF could not be read.
    #[error(transparent)]
    Pdf(#[from] PdfError),

    /// The HTML page did not contain a usable table.
    #[error(transparent)]
    Html(#[from] ScrapeError),

    /// The blocking extraction task panicked or was cancelled.
    #[error("extraction task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Extracts incident rows from a PDF or HTML document.
///
/// # Errors
///
/// Returns [`ExtractError`] if the document cannot be parsed.
pub fn extract_incidents(raw: &[u8]) -> Result<Vec<RawIncident>, ExtractError> {
    if incident_lens_pdf::is_pdf(raw) {
        return Ok(incident_lens_pdf::extract(raw)?);
    }

    let html = String::from_utf8_lossy(raw);
    Ok(incident_lens_scraper::html_table::extract(&html)?)
}

/// Runs [`extract_incidents`] on the blocking thread pool.
///
/// PDF parsing is CPU-bound and must not stall the async worker that
/// drives fetches and HTTP requests.
///
/// # Errors
///
/// Returns [`ExtractError`] if the document cannot be parsed or the
/// blocking task fails.
pub async fn extract_off_thread(raw: Vec<u8>) -> Result<Vec<RawIncident>, ExtractError> {
    tokio::task::spawn_blocking(move || extract_incidents(&raw)).await?
}
