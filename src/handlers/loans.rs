use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use super::{AdminUser, AuthenticatedUser};
use crate::error::ApiError;
use crate::loan::{
    CreateLoanRequest, ListLoansQuery, Loan, LoanSummary, LoanWithClient, Reconciliation,
    UpdateLoanStatusRequest,
};
use crate::models::{ApiResponse, MessageResponse};
use crate::state::AppState;

pub async fn list_loans(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<ListLoansQuery>,
) -> Result<Json<Vec<LoanWithClient>>, ApiError> {
    let scope = state.scope_for(&user).await;
    let loans = state.loan_service.list_loans(scope, query.status).await?;

    Ok(Json(loans))
}

pub async fn list_client_loans(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(client_id): Path<i64>,
) -> Result<Json<Vec<LoanWithClient>>, ApiError> {
    let scope = state.scope_for(&user).await;
    let loans = state
        .loan_service
        .list_loans_for_client(scope, client_id)
        .await?;

    Ok(Json(loans))
}

pub async fn get_loan(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<LoanWithClient>, ApiError> {
    let scope = state.scope_for(&user).await;
    let loan = state.loan_service.get_loan(scope, id).await?;

    Ok(Json(loan))
}

pub async fn create_loan(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(request): Json<CreateLoanRequest>,
) -> Result<(StatusCode, Json<Loan>), ApiError> {
    request.validate()?;
    let loan = state.loan_service.create_loan(request).await?;

    Ok((StatusCode::CREATED, Json(loan)))
}

pub async fn update_loan_status(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateLoanStatusRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.loan_service.set_loan_status(id, request.status).await?;
    tracing::debug!(admin_id = admin.user_id, loan_id = id, "Status override applied");

    Ok(Json(ApiResponse::ok(MessageResponse::new(
        "Loan status updated successfully",
    ))))
}

pub async fn loan_summary(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<LoanSummary>, ApiError> {
    let scope = state.scope_for(&user).await;
    let summary = state.loan_service.loan_summary(scope).await?;

    Ok(Json(summary))
}

pub async fn reconcile_loan(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Reconciliation>>, ApiError> {
    let outcome = state.loan_service.reconcile(id).await?;

    Ok(Json(ApiResponse::ok(outcome)))
}
