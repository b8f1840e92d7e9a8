//! In-memory storage backends.
//!
//! Single-node implementations of the storage traits backed by `DashMap`.
//! Every mutation that decides a race (insert-if-absent, take) goes through a
//! single shard-locked map operation, so callers never observe a
//! check-then-act gap.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use time::OffsetDateTime;

use crate::AuthResult;
use crate::error::AuthError;
use crate::storage::{
    AccountDirectory, PasswordResetStorage, RefreshTokenStorage, RevokedTokenStorage,
};
use crate::types::{Account, PasswordResetToken, RefreshToken, RevokedTokenRecord, Role};

// =============================================================================
// Accounts
// =============================================================================

/// In-memory account directory with a case-insensitive email index.
#[derive(Debug, Default)]
pub struct InMemoryAccountDirectory {
    accounts: DashMap<i64, Account>,
    by_email: DashMap<String, i64>,
    next_id: AtomicI64,
}

impl InMemoryAccountDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new account and assigns it the next id.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidRequest` if the email is already taken.
    pub fn register(
        &self,
        email: &str,
        password_hash: impl Into<String>,
        role: Role,
    ) -> AuthResult<Account> {
        match self.by_email.entry(email.to_ascii_lowercase()) {
            Entry::Occupied(_) => Err(AuthError::invalid_request(format!(
                "account '{email}' already exists"
            ))),
            Entry::Vacant(slot) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
                let account = Account {
                    id,
                    email: email.to_string(),
                    password_hash: password_hash.into(),
                    role,
                };
                self.accounts.insert(id, account.clone());
                slot.insert(id);
                Ok(account)
            }
        }
    }

    /// Number of registered accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Returns `true` if no accounts are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[async_trait]
impl AccountDirectory for InMemoryAccountDirectory {
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<Account>> {
        let Some(id) = self.by_email.get(&email.to_ascii_lowercase()).map(|r| *r) else {
            return Ok(None);
        };
        Ok(self.accounts.get(&id).map(|a| a.clone()))
    }

    async fn find_by_id(&self, id: i64) -> AuthResult<Option<Account>> {
        Ok(self.accounts.get(&id).map(|a| a.clone()))
    }

    async fn update_password_hash(&self, id: i64, password_hash: &str) -> AuthResult<()> {
        match self.accounts.get_mut(&id) {
            Some(mut account) => {
                account.password_hash = password_hash.to_string();
                Ok(())
            }
            None => Err(AuthError::invalid_request(format!("account {id} not found"))),
        }
    }
}

// =============================================================================
// Refresh tokens
// =============================================================================

/// In-memory refresh token store keyed by token hash.
#[derive(Debug, Default)]
pub struct InMemoryRefreshTokenStorage {
    tokens: DashMap<String, RefreshToken>,
}

impl InMemoryRefreshTokenStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns `true` if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Number of tokens owned by an account.
    #[must_use]
    pub fn count_for_account(&self, account_id: i64) -> usize {
        self.tokens
            .iter()
            .filter(|t| t.account_id == account_id)
            .count()
    }
}

#[async_trait]
impl RefreshTokenStorage for InMemoryRefreshTokenStorage {
    async fn create(&self, token: &RefreshToken) -> AuthResult<()> {
        match self.tokens.entry(token.token_hash.clone()) {
            Entry::Occupied(_) => Err(AuthError::storage("duplicate refresh token hash")),
            Entry::Vacant(slot) => {
                slot.insert(token.clone());
                Ok(())
            }
        }
    }

    async fn find_by_hash(&self, token_hash: &str) -> AuthResult<Option<RefreshToken>> {
        Ok(self.tokens.get(token_hash).map(|t| t.clone()))
    }

    async fn take_by_hash(&self, token_hash: &str) -> AuthResult<Option<RefreshToken>> {
        Ok(self.tokens.remove(token_hash).map(|(_, token)| token))
    }

    async fn delete_by_hash(&self, token_hash: &str) -> AuthResult<bool> {
        Ok(self.tokens.remove(token_hash).is_some())
    }

    async fn delete_by_account(&self, account_id: i64) -> AuthResult<u64> {
        let before = self.tokens.len();
        self.tokens.retain(|_, t| t.account_id != account_id);
        Ok(before.saturating_sub(self.tokens.len()) as u64)
    }

    async fn cleanup_expired(&self, now: OffsetDateTime) -> AuthResult<u64> {
        let mut removed = 0u64;
        self.tokens.retain(|_, t| {
            let keep = !t.is_expired_at(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        Ok(removed)
    }
}

// =============================================================================
// Revocation ledger
// =============================================================================

/// In-memory revocation ledger keyed by token hash.
#[derive(Debug, Default)]
pub struct InMemoryRevokedTokenStorage {
    records: DashMap<String, RevokedTokenRecord>,
}

impl InMemoryRevokedTokenStorage {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the ledger is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl RevokedTokenStorage for InMemoryRevokedTokenStorage {
    async fn revoke(&self, record: RevokedTokenRecord) -> AuthResult<bool> {
        match self.records.entry(record.token_hash.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(true)
            }
        }
    }

    async fn is_revoked(&self, token_hash: &str) -> AuthResult<bool> {
        Ok(self.records.contains_key(token_hash))
    }

    async fn purge_expired(&self, now: OffsetDateTime) -> AuthResult<u64> {
        let mut removed = 0u64;
        self.records.retain(|_, r| {
            let keep = !r.is_purgeable_at(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        Ok(removed)
    }
}

// =============================================================================
// Password reset tokens
// =============================================================================

/// In-memory password reset token store keyed by token hash.
#[derive(Debug, Default)]
pub struct InMemoryPasswordResetStorage {
    tokens: DashMap<String, PasswordResetToken>,
}

impl InMemoryPasswordResetStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pending reset tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns `true` if no reset tokens are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl PasswordResetStorage for InMemoryPasswordResetStorage {
    async fn create(&self, token: &PasswordResetToken) -> AuthResult<()> {
        self.tokens.insert(token.token_hash.clone(), token.clone());
        Ok(())
    }

    async fn find_by_hash(&self, token_hash: &str) -> AuthResult<Option<PasswordResetToken>> {
        Ok(self.tokens.get(token_hash).map(|t| t.clone()))
    }

    async fn take_by_hash(&self, token_hash: &str) -> AuthResult<Option<PasswordResetToken>> {
        Ok(self.tokens.remove(token_hash).map(|(_, token)| token))
    }

    async fn delete_by_hash(&self, token_hash: &str) -> AuthResult<bool> {
        Ok(self.tokens.remove(token_hash).is_some())
    }

    async fn delete_by_account(&self, account_id: i64) -> AuthResult<u64> {
        let before = self.tokens.len();
        self.tokens.retain(|_, t| t.account_id != account_id);
        Ok(before.saturating_sub(self.tokens.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    #[tokio::test]
    async fn test_register_and_lookup_case_insensitive() {
        let dir = InMemoryAccountDirectory::new();
        let account = dir.register("Ana@Example.com", "hash", Role::User).unwrap();

        let found = dir.find_by_email("ana@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, account.id);
        assert!(dir.find_by_id(account.id).await.unwrap().is_some());
        assert!(dir.find_by_email("bob@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_register_duplicate_email_rejected() {
        let dir = InMemoryAccountDirectory::new();
        dir.register("a@example.com", "h", Role::User).unwrap();
        assert!(dir.register("A@example.com", "h", Role::Admin).is_err());
        assert_eq!(dir.len(), 1);
    }

    #[tokio::test]
    async fn test_update_password_hash() {
        let dir = InMemoryAccountDirectory::new();
        let account = dir.register("a@example.com", "old", Role::User).unwrap();

        dir.update_password_hash(account.id, "new").await.unwrap();
        let found = dir.find_by_id(account.id).await.unwrap().unwrap();
        assert_eq!(found.password_hash, "new");

        assert!(dir.update_password_hash(999, "x").await.is_err());
    }

    #[tokio::test]
    async fn test_take_by_hash_only_once() {
        let store = InMemoryRefreshTokenStorage::new();
        let (_, token) = RefreshToken::issue(1, OffsetDateTime::now_utc(), Duration::hours(1));
        store.create(&token).await.unwrap();

        assert!(store.take_by_hash(&token.token_hash).await.unwrap().is_some());
        assert!(store.take_by_hash(&token.token_hash).await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_delete_by_account() {
        let store = InMemoryRefreshTokenStorage::new();
        let now = OffsetDateTime::now_utc();
        for account_id in [1, 1, 2] {
            let (_, token) = RefreshToken::issue(account_id, now, Duration::hours(1));
            store.create(&token).await.unwrap();
        }

        assert_eq!(store.delete_by_account(1).await.unwrap(), 2);
        assert_eq!(store.count_for_account(2), 1);
    }

    #[tokio::test]
    async fn test_refresh_cleanup_expired() {
        let store = InMemoryRefreshTokenStorage::new();
        let now = OffsetDateTime::now_utc();
        let (_, stale) = RefreshToken::issue(1, now - Duration::hours(2), Duration::hours(1));
        let (_, fresh) = RefreshToken::issue(1, now, Duration::hours(1));
        store.create(&stale).await.unwrap();
        store.create(&fresh).await.unwrap();

        assert_eq!(store.cleanup_expired(now).await.unwrap(), 1);
        assert!(store.find_by_hash(&fresh.token_hash).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_revoke_is_insert_if_absent() {
        let ledger = InMemoryRevokedTokenStorage::new();
        let now = OffsetDateTime::now_utc();
        let record = RevokedTokenRecord {
            token_hash: "abc".to_string(),
            revoked_at: now,
            expires_at: now + Duration::minutes(15),
        };

        assert!(ledger.revoke(record.clone()).await.unwrap());
        assert!(!ledger.revoke(record).await.unwrap());
        assert_eq!(ledger.len(), 1);
        assert!(ledger.is_revoked("abc").await.unwrap());
    }

    #[tokio::test]
    async fn test_reset_delete_by_account() {
        let store = InMemoryPasswordResetStorage::new();
        let now = OffsetDateTime::now_utc();
        let (_, a) = PasswordResetToken::issue(1, now, Duration::minutes(30));
        let (_, b) = PasswordResetToken::issue(2, now, Duration::minutes(30));
        store.create(&a).await.unwrap();
        store.create(&b).await.unwrap();

        assert_eq!(store.delete_by_account(1).await.unwrap(), 1);
        assert!(store.find_by_hash(&b.token_hash).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_reset_take_is_single_use() {
        let store = InMemoryPasswordResetStorage::new();
        let (_, token) =
            PasswordResetToken::issue(1, OffsetDateTime::now_utc(), Duration::minutes(30));
        store.create(&token).await.unwrap();

        let taken = store.take_by_hash(&token.token_hash).await.unwrap();
        assert_eq!(taken.as_ref(), Some(&token));
        assert!(store.take_by_hash(&token.token_hash).await.unwrap().is_none());
        assert!(store.is_empty());
    }
}
