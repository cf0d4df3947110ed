//! Authentication HTTP handlers

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use super::AuthenticatedUser;
use crate::error::ApiError;
use crate::models::{
    ChangePasswordRequest, LoginRequest, LoginResponse, MessageResponse, RegisterRequest,
    UserResponse,
};
use crate::state::AppState;

/// POST /api/auth/register - Create a regular user account
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    req.validate()?;
    state.auth_service.register(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User registered successfully")),
    ))
}

/// POST /api/auth/login - Exchange credentials for a token
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    req.validate()?;
    let response = state.auth_service.login(&req.username, &req.password).await?;

    Ok(Json(response))
}

/// GET /api/auth/me - Get current authenticated user
pub async fn get_current_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.auth_service.get_user(user.user_id).await?;

    Ok(Json(user.into()))
}

/// POST /api/auth/change-password
pub async fn change_password(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    req.validate()?;
    state
        .auth_service
        .change_password(user.user_id, &req.current_password, &req.new_password)
        .await?;

    Ok(Json(MessageResponse::new("Password changed successfully")))
}
