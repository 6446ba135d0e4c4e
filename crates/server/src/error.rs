//! API error types.

use crate::leaderboard::LeaderboardError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use podium_store::StoreError;
use serde::Serialize;

/// API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("validation error: {0}")]
    Core(#[from] podium_core::Error),

    #[error(transparent)]
    Leaderboard(#[from] LeaderboardError),
}

impl ApiError {
    /// Get the error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::BadRequest(_) => "bad_request",
            Self::Conflict(_) => "conflict",
            Self::Internal(_) => "internal_error",
            Self::Store(e) => match e {
                StoreError::NotFound(_) => "not_found",
                StoreError::AlreadyExists(_) => "already_exists",
                StoreError::Constraint(_) => "conflict",
                _ => "store_error",
            },
            Self::Core(_) => "validation_error",
            Self::Leaderboard(e) => match e {
                LeaderboardError::Validation(_) => "validation_error",
                LeaderboardError::NotFound(_) => "not_found",
                LeaderboardError::Timeout(_) => "timeout",
                LeaderboardError::Conflict(_) => "conflict",
                LeaderboardError::Store(_) => "store_error",
            },
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Store(e) => match e {
                StoreError::NotFound(_) => StatusCode::NOT_FOUND,
                StoreError::AlreadyExists(_) => StatusCode::CONFLICT,
                StoreError::Constraint(_) => StatusCode::CONFLICT,
                StoreError::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Core(_) => StatusCode::BAD_REQUEST,
            Self::Leaderboard(e) => match e {
                LeaderboardError::Validation(_) => StatusCode::BAD_REQUEST,
                LeaderboardError::NotFound(_) => StatusCode::NOT_FOUND,
                LeaderboardError::Conflict(_) => StatusCode::CONFLICT,
                // Transient. A timed-out commit may still have landed.
                LeaderboardError::Timeout(_) | LeaderboardError::Store(_) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        let body = ErrorResponse {
            code: self.code().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
