//! Authentication routes

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::auth;
use crate::state::AppState;

/// Create authentication routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me", get(auth::get_current_user))
        .route("/api/auth/change-password", post(auth::change_password))
}
