//! Authentication extractors
//!
//! Verify the bearer JWT and turn its claims into the caller's identity.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::Serialize;
use std::sync::Arc;

use crate::auth::{verify_token, AuthService, JwtError};
use crate::models::UserRole;
use crate::scope::Identity;

/// Authenticated user extracted from JWT token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub jti: String,
}

impl AuthenticatedUser {
    /// Identity passed down to the services
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.user_id,
            role: self.role,
            email: self.email.clone(),
        }
    }
}

/// Error response for authentication failures
#[derive(Debug, Serialize)]
struct AuthError {
    #[serde(skip)]
    status: StatusCode,
    error: AuthErrorDetails,
}

#[derive(Debug, Serialize)]
struct AuthErrorDetails {
    code: String,
    message: String,
}

impl AuthError {
    fn new(code: &str, message: &str) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            error: AuthErrorDetails {
                code: code.to_string(),
                message: message.to_string(),
            },
        }
    }

    fn forbidden(message: &str) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            ..Self::new("FORBIDDEN", message)
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Extractor for authenticated users
///
/// ```rust,ignore
/// async fn protected_handler(user: AuthenticatedUser) -> impl IntoResponse {
///     format!("Hello, user {}", user.user_id)
/// }
/// ```
#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    AuthError::new(
                        "MISSING_TOKEN",
                        "Authorization header with Bearer token required",
                    )
                    .into_response()
                })?;

        let auth_service = Arc::<AuthService>::from_ref(state);

        let claims = verify_token(bearer.token(), auth_service.jwt_secret()).map_err(|e| {
            let (code, message) = match e {
                JwtError::TokenExpired => ("TOKEN_EXPIRED", "Token has expired"),
                _ => ("INVALID_TOKEN", "Invalid token"),
            };
            AuthError::new(code, message).into_response()
        })?;

        let user_id = claims.user_id().map_err(|_| {
            AuthError::new("INVALID_TOKEN", "Invalid user ID in token").into_response()
        })?;

        let role = UserRole::parse(&claims.role).ok_or_else(|| {
            AuthError::new("INVALID_TOKEN", "Invalid role in token").into_response()
        })?;

        let user = AuthenticatedUser {
            user_id,
            username: claims.username,
            email: claims.email,
            role,
            jti: claims.jti,
        };
        tracing::debug!(
            user_id = user.user_id,
            username = %user.username,
            role = user.role.as_str(),
            jti = %user.jti,
            "Request authenticated"
        );

        Ok(user)
    }
}

/// Extractor that additionally requires the admin role
pub struct AdminUser(pub AuthenticatedUser);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;

        if !matches!(user.role, UserRole::Admin) {
            tracing::warn!(
                user_id = user.user_id,
                username = %user.username,
                jti = %user.jti,
                "Admin route refused"
            );
            return Err(AuthError::forbidden("Admin access required").into_response());
        }

        Ok(AdminUser(user))
    }
}
