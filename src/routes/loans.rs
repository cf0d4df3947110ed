//! Loan route definitions

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::handlers::loans::*;
use crate::state::AppState;

pub fn loan_routes() -> Router<AppState> {
    Router::new()
        .route("/api/loans", get(list_loans).post(create_loan))
        .route("/api/loans/stats/summary", get(loan_summary))
        .route("/api/loans/client/:client_id", get(list_client_loans))
        .route("/api/loans/:id", get(get_loan))
        .route("/api/loans/:id/status", patch(update_loan_status))
        .route("/api/loans/:id/reconcile", post(reconcile_loan))
}
