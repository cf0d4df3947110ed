use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use super::{AdminUser, AuthenticatedUser};
use crate::client::{Client, ClientRequest, ClientSearchQuery};
use crate::error::ApiError;
use crate::models::{ApiResponse, MessageResponse};
use crate::state::AppState;

pub async fn list_clients(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<Client>>, ApiError> {
    let scope = state.scope_for(&user).await;
    let clients = state.client_service.list_clients(scope).await?;

    Ok(Json(clients))
}

pub async fn search_clients(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<ClientSearchQuery>,
) -> Result<Json<Vec<Client>>, ApiError> {
    let scope = state.scope_for(&user).await;
    let clients = state
        .client_service
        .search_clients(scope, &query.q, query.field)
        .await?;

    Ok(Json(clients))
}

pub async fn get_client(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<Client>, ApiError> {
    let scope = state.scope_for(&user).await;
    let client = state.client_service.get_client(scope, id).await?;

    Ok(Json(client))
}

pub async fn create_client(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(request): Json<ClientRequest>,
) -> Result<(StatusCode, Json<Client>), ApiError> {
    let request = request.normalized();
    request.validate()?;
    let client = state.client_service.create_client(request).await?;

    Ok((StatusCode::CREATED, Json(client)))
}

pub async fn update_client(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Json(request): Json<ClientRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let request = request.normalized();
    request.validate()?;
    state.client_service.update_client(id, request).await?;

    Ok(Json(ApiResponse::ok(MessageResponse::new(
        "Client updated successfully",
    ))))
}

pub async fn delete_client(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.client_service.delete_client(id).await?;

    Ok(Json(ApiResponse::ok(MessageResponse::new(
        "Client deleted successfully",
    ))))
}
