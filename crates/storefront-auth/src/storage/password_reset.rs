//! Password reset token storage trait.

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::PasswordResetToken;

/// Storage for single-use password reset tokens.
#[async_trait]
pub trait PasswordResetStorage: Send + Sync {
    /// Stores a new reset token.
    async fn create(&self, token: &PasswordResetToken) -> AuthResult<()>;

    /// Finds a reset token by its hash.
    async fn find_by_hash(&self, token_hash: &str) -> AuthResult<Option<PasswordResetToken>>;

    /// Atomically removes a reset token and returns it.
    ///
    /// When several callers race to take the same hash, exactly one of them
    /// receives `Some`.
    async fn take_by_hash(&self, token_hash: &str) -> AuthResult<Option<PasswordResetToken>>;

    /// Deletes a reset token. Returns `true` if one was removed.
    async fn delete_by_hash(&self, token_hash: &str) -> AuthResult<bool>;

    /// Deletes every pending reset token of an account.
    async fn delete_by_account(&self, account_id: i64) -> AuthResult<u64>;
}
