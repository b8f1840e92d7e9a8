//! Revoked access token storage trait.
//!
//! When an access token is revoked, the hash of its raw encoding is stored
//! until the token would have naturally expired, allowing validation to
//! check for revocation.
//!
//! # Implementation Notes
//!
//! - Lookups happen on every authenticated request and must be fast
//! - Recording an already-present hash must not create a second record
//! - Purging must only ever delete records whose `expires_at` is in the past

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::AuthResult;
use crate::types::RevokedTokenRecord;

/// Storage trait for revoked access tokens.
#[async_trait]
pub trait RevokedTokenStorage: Send + Sync {
    /// Records a revoked token if its hash is not already present.
    ///
    /// # Returns
    ///
    /// Returns `true` if a new record was stored, `false` if the hash was
    /// already revoked.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn revoke(&self, record: RevokedTokenRecord) -> AuthResult<bool>;

    /// Checks if a token hash has been revoked.
    ///
    /// Records past their `expires_at` that have not been purged yet still
    /// count as revoked.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn is_revoked(&self, token_hash: &str) -> AuthResult<bool>;

    /// Deletes every record whose `expires_at` is strictly before `now`.
    ///
    /// # Returns
    ///
    /// Returns the number of records deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the cleanup operation fails.
    async fn purge_expired(&self, now: OffsetDateTime) -> AuthResult<u64>;
}
