//! Account directory trait.
//!
//! The directory is owned by the customer domain. The auth subsystem only
//! resolves identities and, for password resets, writes a new hash.

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::Account;

/// Lookup interface over the account store.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// Finds an account by login email (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<Account>>;

    /// Finds an account by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_id(&self, id: i64) -> AuthResult<Option<Account>>;

    /// Replaces the stored password hash of an account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidRequest` if the account does not exist, or
    /// a storage error.
    async fn update_password_hash(&self, id: i64, password_hash: &str) -> AuthResult<()>;
}
