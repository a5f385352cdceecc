use std::sync::LazyLock;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};

use crate::error::ApiError;

// Stands in for the stored hash when the username is unknown.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("stride-unknown-user").ok());

/// Argon2id with a fresh random salt. Returns the PHC string to store.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, ApiError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| ApiError::Internal(format!("stored password hash unreadable: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Verification for a username that does not exist: the same Argon2 work as a
/// wrong password, against a fixed hash. Always `false` on success.
pub fn verify_unknown_user(password: &str) -> Result<bool, ApiError> {
    let hash = DUMMY_HASH
        .as_deref()
        .ok_or_else(|| ApiError::Internal("dummy password hash unavailable".into()))?;
    verify_password(password, hash).map(|_| false)
}
