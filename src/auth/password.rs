//! bcrypt password hashing
//!
//! Hashing is CPU bound, so both helpers run on the blocking pool.

use crate::error::{ServiceError, ServiceResult};

pub async fn hash_password(password: &str, cost: u32) -> ServiceResult<String> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| ServiceError::Internal(format!("hashing task failed: {e}")))?
        .map_err(|e| ServiceError::Internal(format!("password hashing failed: {e}")))
}

/// A malformed stored hash counts as a mismatch
pub async fn verify_password(password: &str, hash: &str) -> ServiceResult<bool> {
    let password = password.to_owned();
    let hash = hash.to_owned();
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| ServiceError::Internal(format!("hashing task failed: {e}")))?;

    match verified {
        Ok(matches) => Ok(matches),
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash could not be checked");
            Ok(false)
        }
    }
}
