use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, OracleError};

// ============================================================================
// Query Types
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct QuestionParams {
    pub question: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error kind (e.g. "validation_rejected")
    pub error: String,
    /// Text safe to show to the end user
    pub message: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidQuestion => StatusCode::BAD_REQUEST,
        ErrorKind::Configuration => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::GenerationFailure
        | ErrorKind::ValidationRejected
        | ErrorKind::ExecutionFailure
        | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<&OracleError> for ErrorResponse {
    fn from(err: &OracleError) -> Self {
        Self {
            error: err.kind().as_str().to_string(),
            message: err.public_message(),
        }
    }
}

pub fn api_error(err: &OracleError) -> ApiError {
    (status_for(err.kind()), Json(ErrorResponse::from(err)))
}

// ============================================================================
// Health Check Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub db: String,
    pub uptime_secs: i64,
}
