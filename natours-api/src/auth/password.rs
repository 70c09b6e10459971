//! Password hashing using Argon2id
//!
//! Argon2id with the library's default parameters, which track the OWASP
//! recommendation. Hashes are PHC strings, self-describing for
//! verification.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::Error;

/// Password hasher with a minimum-length policy
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    min_password_length: usize,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(8)
    }
}

impl PasswordHasher {
    /// Create a hasher that rejects passwords shorter than `min_password_length`
    #[must_use]
    pub fn new(min_password_length: usize) -> Self {
        Self {
            min_password_length,
        }
    }

    /// Hash a password into a PHC string
    ///
    /// # Errors
    ///
    /// Returns a validation error when the password is shorter than the
    /// configured minimum, or an auth error on a cryptographic failure.
    pub fn hash(&self, password: &str) -> Result<String, Error> {
        if password.chars().count() < self.min_password_length {
            return Err(Error::Validation(format!(
                "Password must be at least {} characters",
                self.min_password_length
            )));
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| Error::Internal(format!("Failed to hash password: {e}")))?;

        Ok(hash.to_string())
    }

    /// Verify a password against a stored PHC hash
    ///
    /// Constant-time comparison; `Ok(false)` on mismatch, an error only for
    /// a malformed hash.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, Error> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| Error::Internal(format!("Invalid password hash format: {e}")))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(Error::Internal(format!(
                "Password verification failed: {e}"
            ))),
        }
    }
}
