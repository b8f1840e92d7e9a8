//! Symmetric signing key management.
//!
//! Access tokens are signed with HS256 over a shared secret. The secret is
//! validated once at startup: a missing or short secret is a fatal
//! misconfiguration, never a runtime fallback.

use std::fmt;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};

use crate::config::SigningConfig;
use crate::error::AuthError;

/// Minimum raw secret length in bytes (256 bits).
pub const MIN_SECRET_LENGTH: usize = 32;

/// HMAC key material derived from the configured secret.
#[derive(Clone)]
pub struct SigningKey {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl SigningKey {
    /// Builds a signing key from raw secret bytes.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::SigningKeyMisconfigured` if the secret is empty
    /// or shorter than [`MIN_SECRET_LENGTH`] bytes.
    pub fn from_secret(secret: &[u8]) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::signing_key("signing secret is not configured"));
        }
        if secret.len() < MIN_SECRET_LENGTH {
            return Err(AuthError::signing_key(format!(
                "signing secret must be at least {MIN_SECRET_LENGTH} bytes, got {}",
                secret.len()
            )));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        })
    }

    /// Builds a signing key from configuration.
    ///
    /// # Errors
    ///
    /// See [`SigningKey::from_secret`].
    pub fn from_config(config: &SigningConfig) -> Result<Self, AuthError> {
        Self::from_secret(config.secret.as_bytes())
    }

    /// The JWS algorithm used with this key.
    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        Algorithm::HS256
    }

    pub(crate) fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("algorithm", &self.algorithm())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_secret_rejected() {
        let err = SigningKey::from_secret(b"").unwrap_err();
        assert!(matches!(err, AuthError::SigningKeyMisconfigured { .. }));
    }

    #[test]
    fn test_short_secret_rejected() {
        let err = SigningKey::from_secret(&[7u8; 31]).unwrap_err();
        assert!(matches!(err, AuthError::SigningKeyMisconfigured { .. }));
        assert!(err.to_string().contains("31"));
    }

    #[test]
    fn test_minimum_secret_accepted() {
        let key = SigningKey::from_secret(&[7u8; MIN_SECRET_LENGTH]).unwrap();
        assert_eq!(key.algorithm(), Algorithm::HS256);
    }

    #[test]
    fn test_from_config() {
        let config = SigningConfig {
            secret: "0123456789abcdef0123456789abcdef".to_string(),
        };
        assert!(SigningKey::from_config(&config).is_ok());
        assert!(SigningKey::from_config(&SigningConfig::default()).is_err());
    }

    #[test]
    fn test_debug_does_not_leak_material() {
        let key = SigningKey::from_secret(b"a-secret-that-is-long-enough-for-hs256").unwrap();
        let rendered = format!("{key:?}");
        assert!(!rendered.contains("a-secret"));
    }
}
