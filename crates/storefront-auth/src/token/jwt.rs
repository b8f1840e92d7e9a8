//! Access token encoding and validation.
//!
//! Access tokens are short-lived HS256 JWTs carrying the account's email as
//! subject, its numeric id and its role. The codec is stateless: revocation
//! lives in the [`RevocationLedger`](super::revocation::RevocationLedger).
//!
//! ## Example
//!
//! ```ignore
//! use storefront_auth::token::{JwtService, SigningKey};
//!
//! let key = SigningKey::from_secret(secret.as_bytes())?;
//! let jwt = JwtService::new(key);
//!
//! let token = jwt.issue(42, "ana@example.com", Role::User, Duration::from_secs(900))?;
//! let claims = jwt.decode(&token)?;
//! ```

use std::time::Duration;

use jsonwebtoken::{Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::signing::SigningKey;
use crate::error::AuthError;
use crate::types::Role;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during JWT operations.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to encode a token.
    #[error("Failed to encode token: {message}")]
    EncodingError {
        /// Description of the encoding error.
        message: String,
    },

    /// The token is structurally malformed.
    #[error("Failed to decode token: {message}")]
    DecodingError {
        /// Description of the decoding error.
        message: String,
    },

    /// The token has expired.
    #[error("Token expired")]
    Expired,

    /// The token signature is invalid.
    #[error("Invalid signature")]
    InvalidSignature,
}

impl JwtError {
    /// Creates a new `EncodingError`.
    #[must_use]
    pub fn encoding_error(message: impl Into<String>) -> Self {
        Self::EncodingError {
            message: message.into(),
        }
    }

    /// Creates a new `DecodingError`.
    #[must_use]
    pub fn decoding_error(message: impl Into<String>) -> Self {
        Self::DecodingError {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a validation error (expired, invalid signature, etc.).
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::Expired | Self::InvalidSignature | Self::DecodingError { .. }
        )
    }
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            _ => Self::decoding_error(err.to_string()),
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::ExpiredToken,
            JwtError::InvalidSignature | JwtError::DecodingError { .. } => {
                AuthError::InvalidSignature
            }
            JwtError::EncodingError { message } => AuthError::internal(message),
        }
    }
}

// ============================================================================
// Claims
// ============================================================================

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject: the account's login email.
    pub sub: String,

    /// Account id.
    pub id: i64,

    /// Account role.
    pub role: Role,

    /// Issued at (unix seconds).
    pub iat: i64,

    /// Expiration time (unix seconds).
    pub exp: i64,

    /// Unique token id. Keeps two tokens issued in the same second distinct.
    pub jti: String,
}

impl AccessTokenClaims {
    /// Returns `true` if the token is expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.exp <= now.unix_timestamp()
    }

    /// The token's expiry as a timestamp, or `None` if `exp` lies outside
    /// the representable date range.
    #[must_use]
    pub fn expires_at(&self) -> Option<OffsetDateTime> {
        OffsetDateTime::from_unix_timestamp(self.exp).ok()
    }
}

// ============================================================================
// JWT Service
// ============================================================================

/// Issues and validates access tokens.
///
/// Expiry is checked here against an explicit `now` rather than by
/// `jsonwebtoken`, which would apply its default leeway.
#[derive(Debug, Clone)]
pub struct JwtService {
    signing_key: SigningKey,
}

impl JwtService {
    /// Creates a new JWT service.
    #[must_use]
    pub fn new(signing_key: SigningKey) -> Self {
        Self { signing_key }
    }

    /// Issues a signed access token valid for `ttl` from now.
    ///
    /// # Errors
    /// Returns an error if encoding fails.
    pub fn issue(
        &self,
        account_id: i64,
        subject: &str,
        role: Role,
        ttl: Duration,
    ) -> Result<String, JwtError> {
        self.issue_at(account_id, subject, role, ttl, OffsetDateTime::now_utc())
    }

    /// Issues a signed access token valid for `ttl` from `now`.
    ///
    /// # Errors
    /// Returns an error if encoding fails or `now + ttl` is not a
    /// representable timestamp.
    pub fn issue_at(
        &self,
        account_id: i64,
        subject: &str,
        role: Role,
        ttl: Duration,
        now: OffsetDateTime,
    ) -> Result<String, JwtError> {
        let iat = now.unix_timestamp();
        let exp = i64::try_from(ttl.as_secs())
            .ok()
            .and_then(|secs| iat.checked_add(secs))
            .filter(|exp| OffsetDateTime::from_unix_timestamp(*exp).is_ok())
            .ok_or_else(|| JwtError::encoding_error("access token lifetime out of range"))?;
        let claims = AccessTokenClaims {
            sub: subject.to_string(),
            id: account_id,
            role,
            iat,
            exp,
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::new(self.signing_key.algorithm()),
            &claims,
            self.signing_key.encoding_key(),
        )
        .map_err(|e| JwtError::encoding_error(e.to_string()))
    }

    /// Decodes and validates a token against the current time.
    ///
    /// # Errors
    /// Returns `JwtError::Expired` if the token is past its expiry, and
    /// `JwtError::InvalidSignature`/`DecodingError` if it cannot be verified.
    pub fn decode(&self, token: &str) -> Result<AccessTokenClaims, JwtError> {
        self.decode_at(token, OffsetDateTime::now_utc())
    }

    /// Decodes and validates a token against `now`.
    ///
    /// The signature is always checked before expiry, so a forged expired
    /// token reports a signature failure.
    ///
    /// # Errors
    /// See [`JwtService::decode`].
    pub fn decode_at(&self, token: &str, now: OffsetDateTime) -> Result<AccessTokenClaims, JwtError> {
        let claims = self.decode_allow_expired(token)?;
        if claims.is_expired_at(now) {
            return Err(JwtError::Expired);
        }
        Ok(claims)
    }

    /// Decodes a token without validating expiration.
    ///
    /// Tokens whose `exp` is not a representable timestamp are rejected, so
    /// every decoded claim set has a usable [`AccessTokenClaims::expires_at`].
    ///
    /// # Errors
    /// Returns an error if decoding fails (signature is still validated).
    pub fn decode_allow_expired(&self, token: &str) -> Result<AccessTokenClaims, JwtError> {
        let mut validation = Validation::new(self.signing_key.algorithm());
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        let claims =
            decode::<AccessTokenClaims>(token, self.signing_key.decoding_key(), &validation)
                .map(|data| data.claims)
                .map_err(JwtError::from)?;
        if claims.expires_at().is_none() {
            return Err(JwtError::decoding_error("exp claim out of range"));
        }
        Ok(claims)
    }

    /// Returns `true` only if the token decodes, is unexpired and belongs to
    /// `expected_subject`.
    #[must_use]
    pub fn validate(&self, token: &str, expected_subject: &str) -> bool {
        self.validate_at(token, expected_subject, OffsetDateTime::now_utc())
    }

    /// [`JwtService::validate`] against an explicit `now`.
    #[must_use]
    pub fn validate_at(&self, token: &str, expected_subject: &str, now: OffsetDateTime) -> bool {
        self.decode_at(token, now)
            .map(|claims| claims.sub == expected_subject)
            .unwrap_or(false)
    }
}

// ============================================================================
// Tests
// ============================================================================
