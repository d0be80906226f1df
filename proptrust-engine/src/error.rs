//! HTTP error mapping for the engine API
//!
//! Every surfaced error carries a stable code, a human-readable message and,
//! where applicable, the pipeline stage name. Internal detail and stack
//! traces never leak to clients.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use proptrust_common::Error;
use serde_json::json;

/// API error wrapper around the engine taxonomy.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = match &err {
            Error::BadInput(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::ExternalUnavailable { .. } => StatusCode::BAD_GATEWAY,
            Error::LedgerRejected(_) => StatusCode::BAD_GATEWAY,
            Error::DeadlineExceeded { .. } => StatusCode::GATEWAY_TIMEOUT,
            Error::Cancelled => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(_)
            | Error::Io(_)
            | Error::Config(_)
            | Error::PersistenceFailed(_)
            | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let mut body = json!({
            "error": {
                "code": err.code(),
                "message": err.to_string(),
            }
        });
        if let Some(stage) = err.stage() {
            body["error"]["stage"] = json!(stage.as_str());
        }

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
