//! Revocation ledger for access tokens.
//!
//! Access tokens are self-contained, so logging out cannot delete them.
//! Instead the SHA-256 of the raw token is recorded here until the token's
//! own expiry, and the authentication gate rejects any token whose hash is
//! present. A periodic purge drops records that can no longer matter.

use std::sync::Arc;

use time::OffsetDateTime;

use super::jwt::{JwtError, JwtService};
use crate::AuthResult;
use crate::storage::RevokedTokenStorage;
use crate::types::{RevokedTokenRecord, hash_token};

/// Records and checks revoked access tokens.
#[derive(Clone)]
pub struct RevocationLedger {
    storage: Arc<dyn RevokedTokenStorage>,
    jwt: Arc<JwtService>,
}

impl RevocationLedger {
    /// Creates a ledger over the given storage.
    pub fn new(storage: Arc<dyn RevokedTokenStorage>, jwt: Arc<JwtService>) -> Self {
        Self { storage, jwt }
    }

    /// Revokes a token.
    ///
    /// Returns `true` if a new record was written, `false` if the token was
    /// already revoked.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidSignature` if the token cannot be verified
    /// (its expiry would be unknown), or a storage error.
    pub async fn revoke(&self, token: &str) -> AuthResult<bool> {
        self.revoke_at(token, OffsetDateTime::now_utc()).await
    }

    /// [`RevocationLedger::revoke`] with an explicit revocation time.
    ///
    /// # Errors
    ///
    /// See [`RevocationLedger::revoke`].
    pub async fn revoke_at(&self, token: &str, now: OffsetDateTime) -> AuthResult<bool> {
        let claims = self.jwt.decode_allow_expired(token)?;
        let expires_at = claims
            .expires_at()
            .ok_or_else(|| JwtError::decoding_error("exp claim out of range"))?;
        let record = RevokedTokenRecord {
            token_hash: hash_token(token),
            revoked_at: now,
            expires_at,
        };

        let inserted = self.storage.revoke(record).await?;
        if inserted {
            tracing::debug!(account_id = claims.id, jti = %claims.jti, "Access token revoked");
        } else {
            tracing::debug!(jti = %claims.jti, "Access token already revoked");
        }
        Ok(inserted)
    }

    /// Returns `true` if the token's hash is recorded.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage lookup fails.
    pub async fn is_revoked(&self, token: &str) -> AuthResult<bool> {
        self.storage.is_revoked(&hash_token(token)).await
    }

    /// Deletes every record whose expiry is strictly before `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub async fn purge_expired(&self, now: OffsetDateTime) -> AuthResult<u64> {
        self.storage.purge_expired(now).await
    }
}
