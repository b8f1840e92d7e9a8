//! Password reset via single-use emailed tokens.
//!
//! Requesting a reset for an unknown email is silently accepted so that the
//! endpoint cannot be used to enumerate accounts. A successful reset also
//! deletes every refresh token of the account, ending all its sessions.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::AuthResult;
use crate::error::AuthError;
use crate::password::PasswordVerifier;
use crate::storage::{AccountDirectory, PasswordResetStorage};
use crate::token::RefreshTokenService;
use crate::types::{Account, PasswordResetToken, hash_token};

/// Delivers reset tokens to account owners.
#[async_trait]
pub trait ResetNotifier: Send + Sync {
    /// Sends the plaintext reset token to the account's owner.
    async fn send_reset(&self, account: &Account, token: &str) -> AuthResult<()>;
}

/// Notifier that only records that a token was issued.
///
/// Used when no outbound mail transport is wired in. The token itself is
/// never logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingResetNotifier;

#[async_trait]
impl ResetNotifier for LoggingResetNotifier {
    async fn send_reset(&self, account: &Account, _token: &str) -> AuthResult<()> {
        tracing::info!(account_id = account.id, "Password reset token issued");
        Ok(())
    }
}

/// Issues and redeems password reset tokens.
#[derive(Clone)]
pub struct PasswordResetService {
    accounts: Arc<dyn AccountDirectory>,
    passwords: Arc<dyn PasswordVerifier>,
    resets: Arc<dyn PasswordResetStorage>,
    refresh_tokens: RefreshTokenService,
    notifier: Arc<dyn ResetNotifier>,
    lifetime: Duration,
}

impl PasswordResetService {
    /// Creates a new password reset service.
    pub fn new(
        accounts: Arc<dyn AccountDirectory>,
        passwords: Arc<dyn PasswordVerifier>,
        resets: Arc<dyn PasswordResetStorage>,
        refresh_tokens: RefreshTokenService,
        notifier: Arc<dyn ResetNotifier>,
        lifetime: Duration,
    ) -> Self {
        Self {
            accounts,
            passwords,
            resets,
            refresh_tokens,
            notifier,
            lifetime,
        }
    }

    /// Starts a reset for `email`. Does nothing if no account matches.
    ///
    /// # Errors
    ///
    /// Returns storage or notifier errors.
    pub async fn request_reset(&self, email: &str) -> AuthResult<()> {
        self.request_reset_at(email, OffsetDateTime::now_utc()).await
    }

    /// [`PasswordResetService::request_reset`] with an explicit `now`.
    ///
    /// # Errors
    ///
    /// Returns storage or notifier errors.
    pub async fn request_reset_at(&self, email: &str, now: OffsetDateTime) -> AuthResult<()> {
        let Some(account) = self.accounts.find_by_email(email).await? else {
            tracing::info!("Password reset requested for unknown email");
            return Ok(());
        };

        let superseded = self.resets.delete_by_account(account.id).await?;
        if superseded > 0 {
            tracing::debug!(account_id = account.id, superseded, "Superseded pending reset tokens");
        }

        let lifetime = time::Duration::try_from(self.lifetime)
            .map_err(|e| AuthError::internal(format!("reset lifetime out of range: {e}")))?;
        let (token, record) = PasswordResetToken::issue(account.id, now, lifetime);
        self.resets.create(&record).await?;
        self.notifier.send_reset(&account, &token).await?;

        tracing::info!(account_id = account.id, "Password reset token generated");
        Ok(())
    }

    /// Redeems a reset token and sets a new password.
    ///
    /// # Errors
    ///
    /// - `AuthError::InvalidRequest` if the new password is blank
    /// - `AuthError::InvalidPasswordResetToken` if the token is unknown,
    ///   already redeemed or expired (an expired token is deleted)
    pub async fn reset_password(&self, token: &str, new_password: &str) -> AuthResult<()> {
        self.reset_password_at(token, new_password, OffsetDateTime::now_utc())
            .await
    }

    /// [`PasswordResetService::reset_password`] with an explicit `now`.
    ///
    /// # Errors
    ///
    /// See [`PasswordResetService::reset_password`].
    pub async fn reset_password_at(
        &self,
        token: &str,
        new_password: &str,
        now: OffsetDateTime,
    ) -> AuthResult<()> {
        if new_password.trim().is_empty() {
            return Err(AuthError::invalid_request("New password is required"));
        }

        // Consume first so that concurrent redemptions of one token race on
        // the removal and only one of them proceeds.
        let record = self
            .resets
            .take_by_hash(&hash_token(token))
            .await?
            .ok_or(AuthError::InvalidPasswordResetToken)?;

        if record.is_expired_at(now) {
            tracing::debug!(account_id = record.account_id, "Expired password reset token");
            return Err(AuthError::InvalidPasswordResetToken);
        }

        let passwords = self.passwords.clone();
        let plain = new_password.to_string();
        let new_hash = tokio::task::spawn_blocking(move || passwords.hash(&plain))
            .await
            .map_err(|e| AuthError::internal(format!("password hashing task failed: {e}")))??;

        self.accounts
            .update_password_hash(record.account_id, &new_hash)
            .await?;
        let sessions = self
            .refresh_tokens
            .delete_all_for_account(record.account_id)
            .await?;

        tracing::info!(
            account_id = record.account_id,
            sessions_ended = sessions,
            "Password successfully reset"
        );
        Ok(())
    }
}
