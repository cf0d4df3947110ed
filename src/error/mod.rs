//! Error types for the Loanbook backend
//!
//! Services return [`ServiceError`]; the HTTP layer converts it into
//! [`ApiError`], which owns status codes and the JSON error body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::store::StoreError;

/// Domain-level failures
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Absent, or outside the caller's scope
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Client not found")]
    ClientNotFound,

    #[error("Access denied")]
    Forbidden,

    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    Internal(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// API error type with HTTP status code mapping
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// JSON error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

/// Error details in the response
#[derive(Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

impl ApiError {
    /// Get the error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InvalidState(_) => "INVALID_STATE",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
        }
    }

    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InvalidState(_) => StatusCode::BAD_REQUEST,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.to_string();

        match &self {
            ApiError::InternalError(_) | ApiError::DatabaseError(_) => {
                tracing::error!(error = %message, code = %error_code, "Server error occurred");
            }
            _ => {
                tracing::debug!(error = %message, code = %error_code, "Client error occurred");
            }
        }

        let body = ErrorResponse {
            error: ErrorDetails {
                code: error_code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(_) | ServiceError::ClientNotFound => {
                ApiError::NotFound(err.to_string())
            }
            ServiceError::Forbidden => ApiError::Forbidden(err.to_string()),
            ServiceError::InvalidState(msg) => ApiError::InvalidState(msg),
            ServiceError::Conflict(msg) => ApiError::Conflict(msg),
            ServiceError::Unauthorized(msg) => ApiError::Unauthorized(msg),
            ServiceError::Store(e) => ApiError::DatabaseError(e.to_string()),
            ServiceError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ApiError::NotFound("test".to_string()).error_code(),
            "NOT_FOUND"
        );
        assert_eq!(
            ApiError::InvalidState("test".to_string()).error_code(),
            "INVALID_STATE"
        );
        assert_eq!(
            ApiError::Forbidden("test".to_string()).error_code(),
            "FORBIDDEN"
        );
    }

    #[test]
    fn test_service_error_mapping() {
        let not_found: ApiError = ServiceError::NotFound("Loan").into();
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);
        assert!(not_found.to_string().contains("Loan not found"));

        let missing_client: ApiError = ServiceError::ClientNotFound.into();
        assert_eq!(missing_client.status_code(), StatusCode::NOT_FOUND);

        let forbidden: ApiError = ServiceError::Forbidden.into();
        assert_eq!(forbidden.status_code(), StatusCode::FORBIDDEN);

        let inactive: ApiError =
            ServiceError::InvalidState("cannot pay inactive loan".to_string()).into();
        assert_eq!(inactive.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(inactive.error_code(), "INVALID_STATE");

        let store: ApiError = ServiceError::Store(StoreError::Database("boom".to_string())).into();
        assert_eq!(store.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
