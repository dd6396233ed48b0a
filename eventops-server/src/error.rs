//! API error type and HTTP mapping
//!
//! Every handler returns `ApiResult<T>`; the conversion to an HTTP response
//! lives here so the JSON error body shape is uniform. Conflict-style
//! errors ("song already processed") deliberately map to 400 rather than
//! 409, matching the public API's established convention.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
///
/// Role failures (401/403) are produced by the auth middleware's own error
/// type before a handler runs, and not-found surfaces through the shared
/// library error; handlers only ever construct the request-shaped variants.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Invalid request with itemized violations (400)
    #[error("Validation failed: {0}")]
    Validation(String, Vec<String>),

    /// Shared library error
    #[error(transparent)]
    Common(#[from] eventops_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use eventops_common::Error as Common;

        let (status, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::Validation(msg, errors) => (StatusCode::BAD_REQUEST, msg, Some(errors)),
            ApiError::Common(err) => match err {
                Common::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
                Common::InvalidInput(msg)
                | Common::Conflict(msg)
                | Common::CapacityExceeded(msg) => (StatusCode::BAD_REQUEST, msg, None),
                other => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string(), None),
            },
        };

        let body = match details {
            Some(errors) => Json(json!({ "error": message, "details": errors })),
            None => Json(json!({ "error": message })),
        };

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
