use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::db::StoreError;

/// Errors surfaced to HTTP clients. Each kind maps to one status code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    ServiceUnavailable(String),
}

pub const STORE_UNAVAILABLE: &str = "Database temporarily unavailable. Please try again.";
pub const SERVICE_UNAVAILABLE: &str = "Service temporarily unavailable. Please try again.";

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            // Duplicate signups are reported as 400 on the public API.
            AppError::Conflict(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => AppError::Conflict("Email already registered".into()),
            StoreError::Unavailable(e) => {
                warn!(error = %e, "store unavailable");
                AppError::ServiceUnavailable(STORE_UNAVAILABLE.into())
            }
            StoreError::Query(e) => {
                error!(error = %e, "non-transient store failure reported as unavailable");
                AppError::ServiceUnavailable(STORE_UNAVAILABLE.into())
            }
            StoreError::Corrupt(e) => {
                error!(error = %e, "stored row violates invariant");
                AppError::ServiceUnavailable(STORE_UNAVAILABLE.into())
            }
        }
    }
}
