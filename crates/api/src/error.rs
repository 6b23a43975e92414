use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use chartlink_records::RecordStoreError;

/// API-level error, mapped onto HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("missing or malformed caller identity")]
    Unauthenticated,
    #[error("not authorized: {0}")]
    Forbidden(String),
    #[error("record not found")]
    NotFound,
    #[error("invalid request: {0}")]
    BadRequest(String),
    #[error("record store error: {0}")]
    Store(#[from] RecordStoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(e) => {
                tracing::error!(error = %e, "record store failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // Store failures are not echoed to callers.
        let message = match &self {
            ApiError::Store(_) => "internal error".to_owned(),
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
