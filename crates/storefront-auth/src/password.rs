//! Password hashing and verification.
//!
//! The session orchestrator only depends on the [`PasswordVerifier`] trait.
//! [`Argon2PasswordVerifier`] is the default implementation.
//!
//! # Security
//!
//! - Hashing uses Argon2id (hybrid mode) with default parameters
//! - Salts are generated using OsRng (cryptographically secure RNG)
//! - Hashes are stored in PHC string format

use std::sync::OnceLock;

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher, PasswordVerifier as _, SaltString, rand_core::OsRng,
    },
};

use crate::AuthResult;
use crate::error::AuthError;

/// Pluggable password hashing policy.
pub trait PasswordVerifier: Send + Sync {
    /// Returns `true` if `plain` matches the stored `hash`.
    ///
    /// Malformed hashes never match.
    fn matches(&self, plain: &str, hash: &str) -> bool;

    /// Hashes a password for storage.
    ///
    /// # Errors
    ///
    /// Returns an error if hashing fails.
    fn hash(&self, plain: &str) -> AuthResult<String>;

    /// Burns roughly the same time as a real verification.
    ///
    /// Called when the account does not exist so that response timing does
    /// not reveal which emails are registered.
    fn verify_dummy(&self, plain: &str) {
        let _ = plain;
    }
}

/// Argon2id password verifier.
#[derive(Debug, Default)]
pub struct Argon2PasswordVerifier {
    dummy_hash: OnceLock<String>,
}

impl Argon2PasswordVerifier {
    /// Creates a verifier with Argon2 default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PasswordVerifier for Argon2PasswordVerifier {
    fn matches(&self, plain: &str, hash: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(hash) else {
            tracing::warn!("Stored password hash is not a valid PHC string");
            return false;
        };
        Argon2::default()
            .verify_password(plain.as_bytes(), &parsed_hash)
            .is_ok()
    }

    fn hash(&self, plain: &str) -> AuthResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(plain.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AuthError::internal(format!("password hashing failed: {e}")))
    }

    fn verify_dummy(&self, plain: &str) {
        let hash = self.dummy_hash.get_or_init(|| {
            self.hash("storefront-dummy-password").unwrap_or_default()
        });
        let _ = self.matches(plain, hash);
    }
}
