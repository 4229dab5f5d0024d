//! Shared credential primitives for Agora services
//!
//! - `jwt`: RS256 access/refresh token issuing and validation
//! - `password`: Argon2id hashing of account passwords

pub mod jwt;
pub mod password;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use password::{hash_password, verify_password, PasswordError, UNUSABLE_PASSWORD};
