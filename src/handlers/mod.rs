//! API handlers for the Loanbook backend

pub mod auth;
pub mod clients;
pub mod loans;
pub mod payments;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::state::AppState;

// Re-export extractors from middleware for handler use
pub use crate::middleware::auth::{AdminUser, AuthenticatedUser};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: String,
    pub version: &'static str,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (status, code, database) = match state.store.health_check().await {
        Ok(()) => ("healthy", StatusCode::OK, "connected".to_string()),
        Err(e) => (
            "unhealthy",
            StatusCode::SERVICE_UNAVAILABLE,
            format!("error: {}", e),
        ),
    };

    (
        code,
        Json(HealthResponse {
            status,
            database,
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}

/// GET /
pub async fn root() -> &'static str {
    "Loanbook API Server"
}
