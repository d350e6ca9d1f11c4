//! Argon2id password hashing and verification.
//!
//! Hashes are stored as PHC strings so the algorithm parameters and salt travel
//! with the hash. Both operations are CPU-bound and run on the blocking pool.

use std::sync::LazyLock;

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

use crate::error::{AppError, AppResult};

pub const MIN_PASSWORD_LENGTH: usize = 6;

// Hash verified against when a login names no account, so unknown usernames cost
// the same Argon2 work as known ones.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("dummy-password-for-unknown-users").ok());

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Returns `Ok(false)` for a wrong password; `Err` only for an unparsable stored hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Runs a full verification against the dummy hash. Always `false` unless the
/// dummy hash could not be built, in which case no work is done.
pub fn verify_dummy(password: &str) -> Result<bool, argon2::password_hash::Error> {
    match DUMMY_HASH.as_deref() {
        Some(hash) => verify_password(password, hash),
        None => Ok(false),
    }
}

pub async fn verify_dummy_blocking(password: String) {
    let outcome = tokio::task::spawn_blocking(move || verify_dummy(&password)).await;
    if !matches!(outcome, Ok(Ok(false))) {
        tracing::warn!("dummy password verification did not run cleanly");
    }
}

pub async fn hash_password_blocking(password: String) -> AppResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(format!("password hashing task failed: {e}")))?
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

pub async fn verify_password_blocking(password: String, hash: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("password verification task failed: {e}")))?
        .map_err(|e| AppError::Internal(format!("stored password hash unreadable: {e}")))
}
