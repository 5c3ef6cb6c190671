//! HTTP handler functions for the incident lens API.

use actix_multipart::form::{MultipartForm, bytes::Bytes, text::Text};
use actix_web::{HttpResponse, web};
use incident_lens_analytics_models::{
    ANALYSIS_FAILED_MESSAGE, AnalysisOutcome, NO_VALID_DATA_MESSAGE,
};
use incident_lens_ingest::{Aggregator, IngestOutcome, UploadedFile, split_urls};
use incident_lens_scraper::Fetcher;
use incident_lens_server_models::{
    AnalyzeRequest, AnalyzeResponse, ApiError, ApiHealth, FeedbackRequest, FeedbackResponse,
    IngestRequest, IngestResponse,
};

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /`
///
/// The interactive page: URL and PDF inputs, charts, feedback form.
pub async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(incident_lens_chart::render_index())
}

fn ingest_response(result: Result<IngestOutcome, incident_lens_ingest::IngestError>) -> HttpResponse {
    match result {
        Ok(outcome) => HttpResponse::Ok().json(IngestResponse {
            incidents: outcome.incidents,
            errors: outcome.errors,
        }),
        Err(e) => HttpResponse::UnprocessableEntity().json(ApiError::new(e.to_string())),
    }
}

/// `POST /api/incidents`
///
/// Fetches every URL and extracts its incidents.
pub async fn ingest<F: Fetcher + 'static>(
    state: web::Data<AppState<F>>,
    body: web::Json<IngestRequest>,
) -> HttpResponse {
    let urls = body.into_inner().urls.into_urls();
    log::info!("Ingesting {} URL(s)", urls.len());

    let result = Aggregator::new(&state.fetcher).run(&urls, &[]).await;
    ingest_response(result)
}

/// Multipart body of `POST /api/incidents/upload`.
#[derive(MultipartForm)]
pub struct UploadForm {
    /// Whitespace-separated URLs.
    urls: Option<Text<String>>,
    /// Uploaded documents; only `.pdf` files are processed.
    files: Vec<Bytes>,
}

impl UploadForm {
    /// Splits the form into URLs and non-empty uploads.
    ///
    /// Browsers send an empty, nameless part when no file was chosen.
    fn into_inputs(self) -> (Vec<String>, Vec<UploadedFile>) {
        let urls = self
            .urls
            .map(|text| split_urls(&text.0))
            .unwrap_or_default();
        let files = self
            .files
            .into_iter()
            .filter(|file| !file.data.is_empty())
            .map(|file| UploadedFile::new(file.file_name.unwrap_or_default(), file.data.to_vec()))
            .collect();
        (urls, files)
    }
}

/// `POST /api/incidents/upload` (`multipart/form-data`)
///
/// Fetches the `urls` field and extracts every uploaded PDF in `files`,
/// merging both into one collection.
pub async fn upload<F: Fetcher + 'static>(
    state: web::Data<AppState<F>>,
    MultipartForm(form): MultipartForm<UploadForm>,
) -> HttpResponse {
    let (urls, files) = form.into_inputs();
    log::info!("Ingesting {} URL(s) and {} upload(s)", urls.len(), files.len());

    let result = Aggregator::new(&state.fetcher).run(&urls, &files).await;
    ingest_response(result)
}

/// `POST /api/analyze`
///
/// Clusters the incident collection and renders the charts.
pub async fn analyze<F: Fetcher + 'static>(
    state: web::Data<AppState<F>>,
    body: web::Json<AnalyzeRequest>,
) -> HttpResponse {
    let incidents = body.into_inner().incidents;
    let config = state.config.analysis;

    let result = web::block(move || incident_lens_analytics::analyze(&incidents, &config)).await;

    match result {
        Ok(Ok(AnalysisOutcome::Report(report))) => HttpResponse::Ok().json(AnalyzeResponse {
            charts: incident_lens_chart::render_charts(&report),
            summary: report.summary(),
        }),
        Ok(Ok(AnalysisOutcome::NoValidData { .. })) => {
            HttpResponse::UnprocessableEntity().json(ApiError::new(NO_VALID_DATA_MESSAGE))
        }
        Ok(Err(_)) => {
            HttpResponse::InternalServerError().json(ApiError::new(ANALYSIS_FAILED_MESSAGE))
        }
        Err(e) => {
            log::error!("Analysis task failed: {e}");
            HttpResponse::InternalServerError().json(ApiError::new(ANALYSIS_FAILED_MESSAGE))
        }
    }
}

/// `POST /api/feedback`
///
/// Logs the feedback and appends it to the feedback file.
pub async fn feedback<F: Fetcher + 'static>(
    state: web::Data<AppState<F>>,
    body: web::Json<FeedbackRequest>,
) -> HttpResponse {
    let text = body.into_inner().feedback;
    let text = text.trim();

    if text.is_empty() {
        return HttpResponse::Ok().json(FeedbackResponse { submitted: false });
    }

    log::info!("Feedback received: {text}");

    match state.feedback.append(text).await {
        Ok(entry) => {
            log::debug!("Recorded feedback {}", entry.id);
            HttpResponse::Ok().json(FeedbackResponse { submitted: true })
        }
        Err(e) => {
            log::error!("{e}");
            HttpResponse::InternalServerError().json(ApiError::new("Failed to record feedback."))
        }
    }
}
