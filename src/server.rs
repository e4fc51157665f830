//! HTTP scan endpoint.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/scan` | Classify a base64-encoded label photo |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! Errors are a flat JSON object with a user-facing message:
//!
//! ```json
//! { "error": "Missing or invalid base64 image string." }
//! ```
//!
//! | Status | When |
//! |--------|------|
//! | 400 | missing or undecodable image, no text found, image too unclear |
//! | 405 | any method other than `POST` on `/scan` |
//! | 413 | body larger than `server.max_body_bytes` |
//! | 500 | text extraction or reference store failed, or the time budget ran out |
//!
//! A 500 never carries partial ingredient data.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so a mobile web client
//! can post photos directly.

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use halal_scan_core::models::ProductVerdict;

use crate::config::Config;
use crate::ocr::{create_extractor, TextExtractor};
use crate::scan::{build_service, ScanError, ScanService};

pub const INVALID_IMAGE_MESSAGE: &str = "Missing or invalid base64 image string.";
pub const LOW_QUALITY_MESSAGE: &str =
    "The image is too unclear to read the ingredients. Please retake the photo.";
pub const NO_TEXT_MESSAGE: &str = "No text detected in the image. Please retake the photo.";
pub const FAILED_MESSAGE: &str = "Failed to process the image.";
pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Method not allowed. Use POST.";

#[derive(Clone)]
struct AppState {
    scanner: Arc<ScanService>,
}

/// Starts the server with the text extractor named in `[ocr]`.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let extractor = create_extractor(&config.ocr)?;
    run_server_with_extractor(config, extractor).await
}

/// Starts the server with a caller-supplied text extractor.
///
/// Binds to `[server].bind` and runs until the process is terminated.
pub async fn run_server_with_extractor(
    config: &Config,
    extractor: Arc<dyn TextExtractor>,
) -> anyhow::Result<()> {
    let scanner = build_service(config, extractor).await?;
    tracing::info!(
        extractor = scanner.extractor_name(),
        learner = config.learner.enabled,
        "scan service ready"
    );

    let app = router(Arc::new(scanner), config.server.max_body_bytes);

    println!("Scan server listening on http://{}", config.server.bind);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn router(scanner: Arc<ScanService>, max_body_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/scan", post(handle_scan).fallback(handle_method_not_allowed))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { scanner })
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<ScanError> for AppError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::InvalidImage => AppError::new(StatusCode::BAD_REQUEST, INVALID_IMAGE_MESSAGE),
            ScanError::NoText => AppError::new(StatusCode::BAD_REQUEST, NO_TEXT_MESSAGE),
            ScanError::LowQuality { .. } => {
                AppError::new(StatusCode::BAD_REQUEST, LOW_QUALITY_MESSAGE)
            }
            ScanError::Collaborator(_) | ScanError::Timeout(_) => {
                tracing::error!(error = %err, "scan failed");
                AppError::new(StatusCode::INTERNAL_SERVER_ERROR, FAILED_MESSAGE)
            }
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /scan ============

/// Handler for `POST /scan`.
///
/// Expects `{ "image": "<base64>" }`. The learner task started by a
/// successful scan is detached; the response does not wait for it.
async fn handle_scan(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ProductVerdict>, AppError> {
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            return Err(AppError::new(
                StatusCode::PAYLOAD_TOO_LARGE,
                "Image is too large.",
            ));
        }
        Err(_) => return Err(AppError::new(StatusCode::BAD_REQUEST, INVALID_IMAGE_MESSAGE)),
    };

    let image = body
        .get("image")
        .and_then(|v| v.as_str())
        .ok_or_else(|| AppError::new(StatusCode::BAD_REQUEST, INVALID_IMAGE_MESSAGE))?;

    let outcome = state.scanner.scan_base64(image).await?;
    Ok(Json(outcome.verdict))
}

async fn handle_method_not_allowed() -> AppError {
    AppError::new(StatusCode::METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED_MESSAGE)
}
