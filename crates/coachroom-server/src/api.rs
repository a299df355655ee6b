//! Shared API error type for the coachroom server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use coachroom_summary::ExtractError;
use thiserror::Error;

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// An external service failed. `details` carries the provider's message.
    #[error("{message}: {details}")]
    Upstream { message: String, details: String },
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl From<ExtractError> for ApiError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::Validation(e) => ApiError::BadRequest(e.to_string()),
            ExtractError::Upstream(e) => ApiError::Upstream {
                message: "Failed to process CV".to_string(),
                details: e.to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, serde_json::json!({ "error": msg })),
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                serde_json::json!({ "error": msg }),
            ),
            ApiError::Upstream { message, details } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "error": message, "details": details }),
            ),
            ApiError::InternalServerError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "error": msg }),
            ),
        };

        (status, Json(body)).into_response()
    }
}
