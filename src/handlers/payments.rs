use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use super::AuthenticatedUser;
use crate::error::ApiError;
use crate::payment::{Payment, PaymentSummary, PaymentWithLoan, RecordPaymentRequest};
use crate::state::AppState;

pub async fn list_payments(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<PaymentWithLoan>>, ApiError> {
    let scope = state.scope_for(&user).await;
    let payments = state.payment_service.list_payments(scope).await?;

    Ok(Json(payments))
}

pub async fn list_loan_payments(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(loan_id): Path<i64>,
) -> Result<Json<Vec<PaymentWithLoan>>, ApiError> {
    let scope = state.scope_for(&user).await;
    let payments = state
        .payment_service
        .list_payments_for_loan(scope, loan_id)
        .await?;

    Ok(Json(payments))
}

pub async fn get_payment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<PaymentWithLoan>, ApiError> {
    let scope = state.scope_for(&user).await;
    let payment = state.payment_service.get_payment(scope, id).await?;

    Ok(Json(payment))
}

/// Any authenticated user may pay their own loans; admins may pay any loan
pub async fn record_payment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<RecordPaymentRequest>,
) -> Result<(StatusCode, Json<Payment>), ApiError> {
    let request = request.normalized();
    request.validate()?;
    let payment = state
        .payment_service
        .record_payment(&user.identity(), request)
        .await?;

    Ok((StatusCode::CREATED, Json(payment)))
}

pub async fn payment_summary(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<PaymentSummary>, ApiError> {
    let scope = state.scope_for(&user).await;
    let summary = state.payment_service.payment_summary(scope).await?;

    Ok(Json(summary))
}
