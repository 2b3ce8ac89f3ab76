use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::config::ConfigError;
use crate::matching::{CohortImportError, MatchingServiceError};
use crate::telemetry::TelemetryError;

/// Top-level application error for the CLI and server wiring.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("server error: {0}")]
    Server(#[from] axum::Error),
    #[error("import error: {0}")]
    Import(#[from] CohortImportError),
    #[error("matching error: {0}")]
    Matching(#[from] MatchingServiceError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Import(_) => StatusCode::BAD_REQUEST,
            AppError::Matching(MatchingServiceError::CohortNotFound(_))
            | AppError::Matching(MatchingServiceError::ProfileNotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            AppError::Matching(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
