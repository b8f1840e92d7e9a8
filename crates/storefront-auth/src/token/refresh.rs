//! Refresh token lifecycle and rotation.
//!
//! Refresh tokens are opaque, single-use and bound to one account. A refresh
//! consumes the presented token and issues exactly one replacement. The
//! consuming step is an atomic take from storage: concurrent refreshes with
//! the same token see exactly one winner, and every other caller gets
//! `RefreshTokenNotFound`. If issuing the replacement fails after the take,
//! the session is lost and the client has to log in again.

use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;

use crate::AuthResult;
use crate::error::AuthError;
use crate::storage::RefreshTokenStorage;
use crate::types::{RefreshToken, hash_token};

/// A freshly issued refresh token: the plaintext for the client and the
/// stored record.
#[derive(Debug, Clone)]
pub struct IssuedRefreshToken {
    /// Plaintext value returned to the client. Never stored.
    pub token: String,

    /// Persisted record.
    pub record: RefreshToken,
}

/// Creates, validates and rotates refresh tokens.
#[derive(Clone)]
pub struct RefreshTokenService {
    storage: Arc<dyn RefreshTokenStorage>,
    lifetime: Duration,
}

impl RefreshTokenService {
    /// Creates a service issuing tokens valid for `lifetime`.
    pub fn new(storage: Arc<dyn RefreshTokenStorage>, lifetime: Duration) -> Self {
        Self { storage, lifetime }
    }

    /// Configured refresh token lifetime.
    #[must_use]
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Issues and stores a new refresh token for an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be stored.
    pub async fn create(&self, account_id: i64) -> AuthResult<IssuedRefreshToken> {
        self.create_at(account_id, OffsetDateTime::now_utc()).await
    }

    /// [`RefreshTokenService::create`] with an explicit creation time.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be stored.
    pub async fn create_at(
        &self,
        account_id: i64,
        now: OffsetDateTime,
    ) -> AuthResult<IssuedRefreshToken> {
        let lifetime = time::Duration::try_from(self.lifetime)
            .map_err(|e| AuthError::internal(format!("refresh lifetime out of range: {e}")))?;
        let (token, record) = RefreshToken::issue(account_id, now, lifetime);
        self.storage.create(&record).await?;
        Ok(IssuedRefreshToken { token, record })
    }

    /// Looks up a refresh token and checks its expiry.
    ///
    /// An expired token is deleted as a side effect.
    ///
    /// # Errors
    ///
    /// - `AuthError::RefreshTokenNotFound` if the token is not stored
    /// - `AuthError::RefreshTokenExpired` if the token is past its expiry
    pub async fn validate(&self, token: &str) -> AuthResult<RefreshToken> {
        self.validate_at(token, OffsetDateTime::now_utc()).await
    }

    /// [`RefreshTokenService::validate`] against an explicit `now`.
    ///
    /// # Errors
    ///
    /// See [`RefreshTokenService::validate`].
    pub async fn validate_at(&self, token: &str, now: OffsetDateTime) -> AuthResult<RefreshToken> {
        let token_hash = hash_token(token);
        let record = self
            .storage
            .find_by_hash(&token_hash)
            .await?
            .ok_or(AuthError::RefreshTokenNotFound)?;

        if record.is_expired_at(now) {
            self.storage.delete_by_hash(&token_hash).await?;
            tracing::debug!(account_id = record.account_id, "Deleted expired refresh token");
            return Err(AuthError::RefreshTokenExpired);
        }

        Ok(record)
    }

    /// Consumes `old_token` and issues a replacement for the same account.
    ///
    /// # Errors
    ///
    /// - `AuthError::RefreshTokenNotFound` if the token is unknown or another
    ///   rotation consumed it first
    /// - `AuthError::RefreshTokenExpired` if the token was past its expiry
    ///   (it is deleted either way)
    /// - a storage error if the replacement cannot be stored
    pub async fn rotate(&self, old_token: &str) -> AuthResult<IssuedRefreshToken> {
        self.rotate_at(old_token, OffsetDateTime::now_utc()).await
    }

    /// [`RefreshTokenService::rotate`] against an explicit `now`.
    ///
    /// # Errors
    ///
    /// See [`RefreshTokenService::rotate`].
    pub async fn rotate_at(
        &self,
        old_token: &str,
        now: OffsetDateTime,
    ) -> AuthResult<IssuedRefreshToken> {
        let consumed = self
            .storage
            .take_by_hash(&hash_token(old_token))
            .await?
            .ok_or(AuthError::RefreshTokenNotFound)?;

        if consumed.is_expired_at(now) {
            tracing::debug!(
                account_id = consumed.account_id,
                "Refresh token expired at rotation"
            );
            return Err(AuthError::RefreshTokenExpired);
        }

        match self.create_at(consumed.account_id, now).await {
            Ok(issued) => Ok(issued),
            Err(e) => {
                tracing::error!(
                    account_id = consumed.account_id,
                    error = %e,
                    "Refresh token consumed but replacement could not be stored"
                );
                Err(e)
            }
        }
    }

    /// Deletes a single refresh token. Returns `true` if one was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub async fn delete_by_token(&self, token: &str) -> AuthResult<bool> {
        self.storage.delete_by_hash(&hash_token(token)).await
    }

    /// Deletes every refresh token of an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub async fn delete_all_for_account(&self, account_id: i64) -> AuthResult<u64> {
        let deleted = self.storage.delete_by_account(account_id).await?;
        tracing::debug!(account_id, deleted, "Deleted all refresh tokens for account");
        Ok(deleted)
    }

    /// Deletes tokens that expired before `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub async fn cleanup_expired(&self, now: OffsetDateTime) -> AuthResult<u64> {
        self.storage.cleanup_expired(now).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryRefreshTokenStorage;

    fn service() -> (RefreshTokenService, Arc<InMemoryRefreshTokenStorage>) {
        let storage = Arc::new(InMemoryRefreshTokenStorage::new());
        (
            RefreshTokenService::new(storage.clone(), Duration::from_secs(3600)),
            storage,
        )
    }

    #[tokio::test]
    async fn test_create_and_validate() {
        let (service, storage) = service();
        let issued = service.create(5).await.unwrap();

        let record = service.validate(&issued.token).await.unwrap();
        assert_eq!(record.account_id, 5);
        assert_eq!(storage.len(), 1);
    }

    #[tokio::test]
    async fn test_validate_unknown_token() {
        let (service, _) = service();
        let err = service.validate("nope").await.unwrap_err();
        assert!(matches!(err, AuthError::RefreshTokenNotFound));
    }

    #[tokio::test]
    async fn test_validate_expired_token_deletes_it() {
        let (service, storage) = service();
        let now = OffsetDateTime::now_utc();
        let issued = service.create_at(5, now).await.unwrap();

        let later = now + time::Duration::hours(2);
        let err = service.validate_at(&issued.token, later).await.unwrap_err();
        assert!(matches!(err, AuthError::RefreshTokenExpired));
        assert!(storage.is_empty());

        let err = service.validate_at(&issued.token, later).await.unwrap_err();
        assert!(matches!(err, AuthError::RefreshTokenNotFound));
    }

    #[tokio::test]
    async fn test_rotate_replaces_token() {
        let (service, storage) = service();
        let old = service.create(5).await.unwrap();

        let new = service.rotate(&old.token).await.unwrap();
        assert_ne!(new.token, old.token);
        assert_eq!(new.record.account_id, 5);
        assert_eq!(storage.count_for_account(5), 1);

        let err = service.rotate(&old.token).await.unwrap_err();
        assert!(matches!(err, AuthError::RefreshTokenNotFound));
        assert!(service.validate(&new.token).await.is_ok());
    }

    #[tokio::test]
    async fn test_rotate_expired_token() {
        let (service, storage) = service();
        let now = OffsetDateTime::now_utc();
        let old = service.create_at(5, now).await.unwrap();

        let err = service
            .rotate_at(&old.token, now + time::Duration::hours(2))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::RefreshTokenExpired));
        assert!(storage.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_rotation_single_winner() {
        let (service, storage) = service();
        let old = service.create(9).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let service = service.clone();
            let token = old.token.clone();
            handles.push(tokio::spawn(async move { service.rotate(&token).await }));
        }

        let mut winners = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => winners += 1,
                Err(e) => assert!(matches!(e, AuthError::RefreshTokenNotFound)),
            }
        }

        assert_eq!(winners, 1);
        assert_eq!(storage.count_for_account(9), 1);
    }

    #[tokio::test]
    async fn test_delete_by_token_and_account() {
        let (service, storage) = service();
        let a = service.create(1).await.unwrap();
        service.create(1).await.unwrap();
        service.create(2).await.unwrap();

        assert!(service.delete_by_token(&a.token).await.unwrap());
        assert!(!service.delete_by_token(&a.token).await.unwrap());
        assert_eq!(service.delete_all_for_account(1).await.unwrap(), 1);
        assert_eq!(storage.len(), 1);
    }
}
