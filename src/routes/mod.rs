//! Route definitions for the Loanbook API

mod auth;
mod clients;
mod loans;
mod payments;

use axum::{routing::get, Router};

use crate::handlers::{health_check, root};
use crate::middleware;
use crate::state::AppState;

pub use auth::auth_routes;
pub use clients::client_routes;
pub use loans::loan_routes;
pub use payments::payment_routes;

/// Full application router with request tracing.
///
/// CORS is left to the caller since it depends on deployment config.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .merge(auth_routes())
        .merge(client_routes())
        .merge(loan_routes())
        .merge(payment_routes())
        .with_state(state)
        .layer(axum::middleware::from_fn(middleware::request_tracing))
}
