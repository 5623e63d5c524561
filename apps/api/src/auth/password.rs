use std::sync::OnceLock;

use anyhow::anyhow;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use uuid::Uuid;

use crate::errors::AppError;

fn hash_blocking(password: &str) -> anyhow::Result<String> {
    // v4 UUIDs carry 122 random bits from the OS RNG.
    let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())
        .map_err(|e| anyhow!("could not build salt: {e}"))?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("could not hash password: {e}"))?;
    Ok(hash.to_string())
}

fn verify_blocking(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Hash checked for logins with an unknown email, so they cost the same as a wrong password.
fn dummy_hash() -> &'static str {
    static DUMMY: OnceLock<String> = OnceLock::new();
    DUMMY.get_or_init(|| hash_blocking("no such account").unwrap_or_default())
}

/// Runs on the blocking pool.
pub async fn hash_password(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_blocking(&password))
        .await
        .map_err(|e| AppError::Internal(anyhow!("hashing task failed: {e}")))?
        .map_err(AppError::Internal)
}

pub async fn verify_password(password: String, stored: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify_blocking(&password, &stored))
        .await
        .map_err(|e| AppError::Internal(anyhow!("verification task failed: {e}")))
}

/// Spends one verification on the dummy hash. Always false.
pub async fn verify_unknown_account(password: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || {
        let _ = verify_blocking(&password, dummy_hash());
        false
    })
    .await
    .map_err(|e| AppError::Internal(anyhow!("verification task failed: {e}")))
}
