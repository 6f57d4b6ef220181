//! Password handling for account credentials.
//!
//! New passwords are checked against the account policy before hashing.
//! Hashes are Argon2id in PHC string format with a fresh random salt per
//! call, so equal passwords never produce equal hashes. Verification
//! treats a mismatch as a normal outcome, not an error.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordVerifier, SaltString};
use argon2::{Argon2, PasswordHasher as _};

use cliphub_core::error::AppError;
use cliphub_core::result::AppResult;

/// Shortest password accepted when an account is created.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Hashes new passwords and checks login attempts against stored hashes.
#[derive(Debug, Clone, Default)]
pub struct PasswordHasher;

impl PasswordHasher {
    pub fn new() -> Self {
        Self
    }

    /// Validates a candidate password against the account policy, then
    /// hashes it. The length check counts characters, not bytes.
    pub fn hash_password(&self, candidate: &str) -> AppResult<String> {
        if candidate.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AppError::validation(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }

        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(candidate.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::internal(format!("Could not hash password: {e}")))
    }

    /// Checks a login attempt against a stored hash.
    ///
    /// `Ok(false)` is a plain mismatch; a stored hash that cannot be
    /// parsed or verified is an error.
    pub fn verify_password(&self, candidate: &str, stored: &str) -> AppResult<bool> {
        let parsed = PasswordHash::new(stored)
            .map_err(|e| AppError::internal(format!("Stored password hash is malformed: {e}")))?;

        match Argon2::default().verify_password(candidate.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AppError::internal(format!("Password check failed: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cliphub_core::error::ErrorKind;

    #[test]
    fn hash_and_verify_roundtrip() {
        let hasher = PasswordHasher::new();
        let hash = hasher.hash_password("correct horse battery").unwrap();
        assert!(hasher.verify_password("correct horse battery", &hash).unwrap());
        assert!(!hasher.verify_password("correct horse staple", &hash).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let hasher = PasswordHasher::new();
        let a = hasher.hash_password("same-password").unwrap();
        let b = hasher.hash_password("same-password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn rejects_passwords_below_the_minimum_length() {
        let hasher = PasswordHasher::new();
        let err = hasher.hash_password("short7!").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn malformed_stored_hash_is_an_error_not_a_mismatch() {
        let hasher = PasswordHasher::new();
        let err = hasher.verify_password("whatever-pw", "not-a-phc-string").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Internal);
    }
}
