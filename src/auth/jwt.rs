//! JWT token generation and validation

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::User;

/// JWT-related errors
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Token encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Token decoding failed: {0}")]
    DecodingFailed(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

/// JWT claims carried by every access token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    pub username: String,
    /// Used to resolve the caller's client record
    pub email: String,
    /// User role
    pub role: String,
    /// JWT ID
    pub jti: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Result<i64, JwtError> {
        self.sub
            .parse()
            .map_err(|_| JwtError::InvalidToken("subject is not a user id".to_string()))
    }
}

/// Sign a token for `user` valid for `ttl_seconds`
pub fn generate_token(user: &User, secret: &str, ttl_seconds: i64) -> Result<String, JwtError> {
    let now = Utc::now();
    let exp = now + Duration::seconds(ttl_seconds);

    let claims = Claims {
        sub: user.id.to_string(),
        username: user.username.clone(),
        email: user.email.clone(),
        role: user.role.as_str().to_string(),
        jti: Uuid::new_v4().to_string(),
        iat: now.timestamp(),
        exp: exp.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| JwtError::EncodingFailed(e.to_string()))
}

/// Verify and decode a JWT token
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let mut validation = Validation::default();
    validation.validate_exp = true;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => JwtError::TokenExpired,
        _ => JwtError::DecodingFailed(e.to_string()),
    })?;

    Ok(token_data.claims)
}
