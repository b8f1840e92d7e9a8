//! Refresh token storage trait.
//!
//! # Security Considerations
//!
//! - Tokens are stored as SHA-256 hashes only
//! - Taking a token out of the store must be atomic: it is the point at
//!   which a rotation either wins or loses
//! - Expired tokens should be cleaned up periodically

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::AuthResult;
use crate::types::refresh_token::RefreshToken;

/// Storage trait for refresh tokens.
///
/// # Implementations
///
/// - [`InMemoryRefreshTokenStorage`](super::memory::InMemoryRefreshTokenStorage) - single-node store
#[async_trait]
pub trait RefreshTokenStorage: Send + Sync {
    /// Stores a new refresh token.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be stored (e.g., duplicate hash,
    /// storage unavailable).
    async fn create(&self, token: &RefreshToken) -> AuthResult<()>;

    /// Finds a refresh token by its hash.
    ///
    /// # Returns
    ///
    /// Returns `Some(token)` if found, `None` if not found.
    /// This returns tokens regardless of expiration status;
    /// callers should check `is_expired_at()` before using.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_hash(&self, token_hash: &str) -> AuthResult<Option<RefreshToken>>;

    /// Atomically removes a token and returns it.
    ///
    /// When several callers race to take the same hash, exactly one of them
    /// receives `Some`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn take_by_hash(&self, token_hash: &str) -> AuthResult<Option<RefreshToken>>;

    /// Deletes a single token. Returns `true` if a token was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn delete_by_hash(&self, token_hash: &str) -> AuthResult<bool>;

    /// Deletes every token owned by an account ("log out everywhere").
    ///
    /// # Returns
    ///
    /// Returns the number of tokens deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn delete_by_account(&self, account_id: i64) -> AuthResult<u64>;

    /// Deletes tokens that expired before `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cleanup operation fails.
    async fn cleanup_expired(&self, now: OffsetDateTime) -> AuthResult<u64>;
}
