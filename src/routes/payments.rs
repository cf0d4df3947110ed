//! Payment route definitions

use axum::{routing::get, Router};

use crate::handlers::payments::*;
use crate::state::AppState;

pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/api/payments", get(list_payments).post(record_payment))
        .route("/api/payments/stats/summary", get(payment_summary))
        .route("/api/payments/loan/:loan_id", get(list_loan_payments))
        .route("/api/payments/:id", get(get_payment))
}
