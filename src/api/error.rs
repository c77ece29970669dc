//! Shared error handling for API endpoints.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

/// API error type with automatic response conversion.
pub enum ApiError {
    BadGateway(String),
    Internal(String),
}

impl ApiError {
    /// Upstream store failure: logged with detail, answered with the
    /// context only.
    pub fn upstream(context: &str, e: impl std::fmt::Display) -> Self {
        error!("{}: {}", context, e);
        Self::BadGateway(context.into())
    }

    /// Failure inside a pass that may have partially run: logged with
    /// detail, answered with the context only.
    pub fn internal(context: &str, e: impl std::fmt::Display) -> Self {
        error!("{}: {}", context, e);
        Self::Internal(context.into())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
