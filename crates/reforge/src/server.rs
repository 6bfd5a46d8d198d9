//! HTTP service for the migration pipeline (Axum).
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/analyze` | Analyze a legacy project and propose an architecture |
//! | `POST` | `/generate` | Generate, validate, and package a target project |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! Both pipeline calls are synchronous and long-running; the response
//! arrives when the stage completes.
//!
//! # Error Contract
//!
//! All error responses share one JSON shape:
//!
//! ```json
//! { "error": { "code": "not_found", "message": "analysis not found: ..." } }
//! ```
//!
//! Codes: `not_found` (404), `schema_violation` (422), `build_failed`
//! (500), `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser
//! frontends driving the pipeline.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::analyze::run_analyze;
use crate::config::Config;
use crate::error::PipelineError;
use crate::generate::{run_generate, GenerateStatus};
use crate::pipeline::Pipeline;

#[derive(Clone)]
struct AppState {
    pipeline: Arc<Pipeline>,
}

/// Start the HTTP server on the configured bind address.
///
/// Runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pipeline = Arc::new(Pipeline::from_config(config).await?);
    let state = AppState { pipeline };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/analyze", post(handle_analyze))
        .route("/generate", post(handle_generate))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    info!(bind = %config.server.bind, "server listening");

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        let (status, code) = match &err {
            PipelineError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            PipelineError::Schema(_) => (StatusCode::UNPROCESSABLE_ENTITY, "schema_violation"),
            PipelineError::BuildFailed { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "build_failed")
            }
            PipelineError::Persistence(_) | PipelineError::Other(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
        };
        AppError {
            status,
            code: code.to_string(),
            message: err.to_string(),
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

// ============ POST /analyze ============

#[derive(Deserialize)]
struct AnalyzeRequest {
    /// Path to a legacy project directory or `.zip` archive on the
    /// server's filesystem.
    source_path: PathBuf,
}

#[derive(Serialize)]
struct AnalyzeResponse {
    analysis_id: String,
    proposed_architecture: serde_json::Value,
    skipped_files: Vec<String>,
}

async fn handle_analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let outcome = run_analyze(&state.pipeline, &req.source_path).await?;

    let proposed_architecture =
        serde_json::to_value(&outcome.architecture).map_err(|e| AppError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "internal".to_string(),
            message: e.to_string(),
        })?;

    Ok(Json(AnalyzeResponse {
        analysis_id: outcome.analysis_id,
        proposed_architecture,
        skipped_files: outcome.skipped,
    }))
}

// ============ POST /generate ============

#[derive(Deserialize)]
struct GenerateRequest {
    analysis_id: String,
    /// Optional wholesale architecture override for this run only.
    #[serde(default)]
    architecture: Option<serde_json::Value>,
    /// Overrides the configured validation default when present.
    #[serde(default)]
    skip_validation: Option<bool>,
}

#[derive(Serialize)]
struct GenerateResponse {
    archive_path: PathBuf,
    status: GenerateStatus,
    skipped_files: Vec<String>,
}

async fn handle_generate(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    let outcome = run_generate(
        &state.pipeline,
        &req.analysis_id,
        req.architecture,
        req.skip_validation,
    )
    .await?;

    Ok(Json(GenerateResponse {
        archive_path: outcome.archive_path,
        status: outcome.status,
        skipped_files: outcome.skipped,
    }))
}
