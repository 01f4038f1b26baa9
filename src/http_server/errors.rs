//! HTTP error mapping
//!
//! Each store taxonomy kind maps to exactly one HTTP status so callers can
//! branch on the response: NotFound → 404, InvalidArgument → 400,
//! FailedPrecondition → 412, Conflict → 409.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::store::StoreError;

/// Result type for HTTP handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// API-level error wrapping the store taxonomy
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Domain error from the store layer
    #[error("{0}")]
    Store(#[from] StoreError),
}

impl ApiError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Store(StoreError::InvalidArgument(_)) => StatusCode::BAD_REQUEST,
            ApiError::Store(StoreError::FailedPrecondition(_)) => StatusCode::PRECONDITION_FAILED,
            ApiError::Store(StoreError::Conflict(_)) => StatusCode::CONFLICT,
        }
    }

    /// Get the stable taxonomy code string
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Store(err) => err.code(),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub status: u16,
}

impl From<&ApiError> for ErrorResponse {
    fn from(err: &ApiError) -> Self {
        Self {
            error: err.to_string(),
            code: err.code().to_string(),
            status: err.status_code().as_u16(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse::from(&self));
        (status, body).into_response()
    }
}
