#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for incident lens.
//!
//! Serves the interactive page at `/` and exposes ingestion
//! (`/api/incidents` for JSON URL lists, `/api/incidents/upload` for
//! multipart URLs plus PDFs), analysis (`/api/analyze`) and feedback
//! (`/api/feedback`). The server holds no per-client
//! state: the incident collection returned by ingestion is passed back by
//! the client for analysis.

pub mod config;
pub mod feedback;
mod handlers;

use actix_cors::Cors;
use actix_multipart::form::MultipartFormConfig;
use actix_web::{App, HttpResponse, HttpServer, error::InternalError, middleware, web};
use incident_lens_scraper::{FetchError, Fetcher, HttpFetcher};
use incident_lens_server_models::ApiError;

use crate::config::AppConfig;
use crate::feedback::FeedbackLog;

/// Errors that can stop the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The HTTP client could not be built.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Binding or serving failed.
    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shared application state.
pub struct AppState<F: Fetcher = HttpFetcher> {
    /// Settings loaded at startup.
    pub config: AppConfig,
    /// Source of remote documents.
    pub fetcher: F,
    /// Where feedback is recorded.
    pub feedback: FeedbackLog,
}

impl<F: Fetcher> AppState<F> {
    /// Builds state around an existing fetcher.
    pub fn new(config: AppConfig, fetcher: F) -> Self {
        let feedback = FeedbackLog::new(config.feedback_path.clone());
        Self {
            config,
            fetcher,
            feedback,
        }
    }
}

impl AppState {
    /// Builds state with an HTTP fetcher configured from `config.fetch`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] if the HTTP client cannot be built.
    pub fn from_config(config: AppConfig) -> Result<Self, FetchError> {
        let fetcher = HttpFetcher::new(&config.fetch)?;
        Ok(Self::new(config, fetcher))
    }
}

/// Registers the routes, body limits and shared state.
pub fn configure<F: Fetcher + 'static>(cfg: &mut web::ServiceConfig, state: web::Data<AppState<F>>) {
    let limit = state.config.max_upload_bytes;

    let json = web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| {
            let response = HttpResponse::BadRequest().json(ApiError::new(err.to_string()));
            InternalError::from_response(err, response).into()
        });

    let multipart = MultipartFormConfig::default()
        .total_limit(limit)
        .memory_limit(limit)
        .error_handler(|err, _req| {
            let response = HttpResponse::BadRequest().json(ApiError::new(err.to_string()));
            InternalError::from_response(err, response).into()
        });

    cfg.app_data(state)
        .app_data(json)
        .app_data(multipart)
        .app_data(web::PayloadConfig::new(limit))
        .route("/", web::get().to(handlers::index))
        .service(
            web::scope("/api")
                .route("/health", web::get().to(handlers::health))
                .route("/incidents", web::post().to(handlers::ingest::<F>))
                .route("/incidents/upload", web::post().to(handlers::upload::<F>))
                .route("/analyze", web::post().to(handlers::analyze::<F>))
                .route("/feedback", web::post().to(handlers::feedback::<F>)),
        );
}

/// Starts the incident lens API server.
///
/// This is a regular async function; the caller provides the runtime
/// (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns [`ServerError`] if the HTTP client cannot be built or the
/// server fails to bind or run.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: AppConfig) -> Result<(), ServerError> {
    let bind_addr = config.bind_addr.clone();
    let port = config.port;

    log::info!(
        "Feedback will be recorded to {}",
        config.feedback_path.display()
    );
    let state = web::Data::new(AppState::from_config(config)?);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .configure(|cfg| configure(cfg, state.clone()))
    })
    .bind((bind_addr, port))?
    .run()
    .await?;

    Ok(())
}
