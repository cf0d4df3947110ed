//! Authentication service
//!
//! Username/password accounts, bcrypt hashes, and JWT issuance.

use crate::error::{ServiceError, ServiceResult};
use crate::models::{
    LoginResponse, NewUser, RegisterRequest, User, UserResponse, UserRole,
};
use crate::store::{SharedStore, StoreError};

use super::jwt::{generate_token, JwtError};
use super::password::{hash_password, verify_password};

const INVALID_CREDENTIALS: &str = "invalid username or password";

impl From<JwtError> for ServiceError {
    fn from(e: JwtError) -> Self {
        ServiceError::Internal(e.to_string())
    }
}

/// Credentials of the account created at startup when missing
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    store: SharedStore,
    jwt_secret: String,
    token_ttl_seconds: i64,
    bcrypt_cost: u32,
}

impl AuthService {
    /// Create a new AuthService
    pub fn new(
        store: SharedStore,
        jwt_secret: String,
        token_ttl_seconds: i64,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            store,
            jwt_secret,
            token_ttl_seconds,
            bcrypt_cost,
        }
    }

    /// Register a regular user.
    ///
    /// Self-registration never grants the admin role. A client record with
    /// the same email is created alongside unless one already exists, which
    /// links the new account to that client's loans.
    pub async fn register(&self, request: RegisterRequest) -> ServiceResult<UserResponse> {
        let username = request.username.trim();
        let email = request.email.trim();

        if self.store.user_exists(username, email).await? {
            return Err(ServiceError::Conflict(
                "user with this username or email already exists".to_string(),
            ));
        }

        let password_hash = hash_password(&request.password, self.bcrypt_cost).await?;
        let user = self
            .store
            .insert_user(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
                role: UserRole::User,
            })
            .await
            .map_err(|e| match e {
                StoreError::UniqueViolation(_) => ServiceError::Conflict(
                    "user with this username or email already exists".to_string(),
                ),
                other => ServiceError::Store(other),
            })?;

        // The account is usable without a client record, it just sees nothing
        if let Err(e) = self.store.ensure_client_for_user(username, email).await {
            tracing::warn!(user_id = user.id, error = %e, "Failed to create client for new user");
        }

        tracing::info!(user_id = user.id, username = %user.username, "User registered");
        Ok(user.into())
    }

    /// Check credentials and issue an access token
    pub async fn login(&self, username: &str, password: &str) -> ServiceResult<LoginResponse> {
        let user = self
            .store
            .find_user_by_username(username.trim())
            .await?
            .ok_or_else(|| ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        if !verify_password(password, &user.password_hash).await? {
            tracing::debug!(user_id = user.id, "Login rejected: wrong password");
            return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let token = generate_token(&user, &self.jwt_secret, self.token_ttl_seconds)?;

        tracing::info!(user_id = user.id, "User logged in");
        Ok(LoginResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in: self.token_ttl_seconds,
            user: user.into(),
        })
    }

    /// Get user by ID
    pub async fn get_user(&self, user_id: i64) -> ServiceResult<User> {
        self.store
            .find_user_by_id(user_id)
            .await?
            .ok_or(ServiceError::NotFound("User"))
    }

    pub async fn change_password(
        &self,
        user_id: i64,
        current_password: &str,
        new_password: &str,
    ) -> ServiceResult<()> {
        let user = self.get_user(user_id).await?;

        if !verify_password(current_password, &user.password_hash).await? {
            return Err(ServiceError::Unauthorized(
                "current password is incorrect".to_string(),
            ));
        }

        let password_hash = hash_password(new_password, self.bcrypt_cost).await?;
        if self
            .store
            .update_user_password(user_id, &password_hash)
            .await?
            == 0
        {
            return Err(ServiceError::NotFound("User"));
        }

        tracing::info!(user_id, "Password changed");
        Ok(())
    }

    /// Create the admin account unless the username is already taken.
    ///
    /// Returns whether an account was created.
    pub async fn ensure_admin(&self, seed: &AdminSeed) -> ServiceResult<bool> {
        if self
            .store
            .find_user_by_username(&seed.username)
            .await?
            .is_some()
        {
            return Ok(false);
        }

        let password_hash = hash_password(&seed.password, self.bcrypt_cost).await?;
        let user = self
            .store
            .insert_user(NewUser {
                username: seed.username.clone(),
                email: seed.email.clone(),
                password_hash,
                role: UserRole::Admin,
            })
            .await?;

        tracing::info!(user_id = user.id, username = %user.username, "Admin account created");
        Ok(true)
    }

    /// Get JWT secret (for middleware access)
    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }
}
