/// Password hashing and verification using Argon2id
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

/// Stored in place of a hash for accounts that cannot log in.
/// Never parses as a PHC string, so verification always fails.
pub const UNUSABLE_PASSWORD: &str = "!";

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// Hash a password with Argon2id and a random per-password salt
///
/// Returns a PHC-formatted string safe for database storage.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Verify a password against its stored hash
///
/// Returns `Ok(false)` on mismatch and for accounts holding [`UNUSABLE_PASSWORD`].
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, PasswordError> {
    if password_hash == UNUSABLE_PASSWORD {
        return Ok(false);
    }

    let parsed_hash =
        PasswordHash::new(password_hash).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::InvalidHash(e.to_string())),
    }
}
