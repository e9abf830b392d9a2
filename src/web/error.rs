// src/web/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use crate::error::ScanError;

/// A failed request, rendered as `{"status": "error", "message": ...}`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unavailable(String),
    InternalError(String),
}

impl From<ScanError> for ApiError {
    fn from(e: ScanError) -> Self {
        match e {
            ScanError::Validation(msg) => ApiError::BadRequest(msg),
            other => {
                error!(error = %other, "Request failed.");
                ApiError::InternalError(other.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "status": "error",
            "message": message
        }));

        (status, body).into_response()
    }
}
