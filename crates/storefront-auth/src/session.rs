//! Login, refresh and logout orchestration.
//!
//! [`SessionService`] ties the access token codec, the refresh token store
//! and the revocation ledger together:
//!
//! - **login** verifies credentials and issues one access/refresh pair
//! - **refresh** rotates the refresh token and issues a new access token
//! - **logout** revokes the access token and deletes the refresh token
//!
//! It also owns the periodic maintenance job that purges the revocation
//! ledger and expired refresh tokens.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::AuthResult;
use crate::error::AuthError;
use crate::password::PasswordVerifier;
use crate::storage::AccountDirectory;
use crate::token::{JwtService, RefreshTokenService, RevocationLedger};
use crate::types::Account;

/// Token pair returned by login and refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// Signed access token.
    pub access_token: String,

    /// Opaque single-use refresh token.
    pub refresh_token: String,

    /// Always `Bearer`.
    pub token_type: String,

    /// Access token lifetime in milliseconds.
    pub expires_in: u64,
}

/// Counts from one maintenance run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    /// Revocation records purged.
    pub revocations_purged: u64,
    /// Expired refresh tokens deleted.
    pub refresh_tokens_purged: u64,
}

/// Coordinates the session lifecycle.
#[derive(Clone)]
pub struct SessionService {
    accounts: Arc<dyn AccountDirectory>,
    passwords: Arc<dyn PasswordVerifier>,
    jwt: Arc<JwtService>,
    refresh_tokens: RefreshTokenService,
    ledger: RevocationLedger,
    access_token_lifetime: Duration,
}

impl SessionService {
    /// Creates a new session service.
    pub fn new(
        accounts: Arc<dyn AccountDirectory>,
        passwords: Arc<dyn PasswordVerifier>,
        jwt: Arc<JwtService>,
        refresh_tokens: RefreshTokenService,
        ledger: RevocationLedger,
        access_token_lifetime: Duration,
    ) -> Self {
        Self {
            accounts,
            passwords,
            jwt,
            refresh_tokens,
            ledger,
            access_token_lifetime,
        }
    }

    /// Access token codec.
    #[must_use]
    pub fn jwt(&self) -> &Arc<JwtService> {
        &self.jwt
    }

    /// Revocation ledger.
    #[must_use]
    pub fn ledger(&self) -> &RevocationLedger {
        &self.ledger
    }

    /// Refresh token store.
    #[must_use]
    pub fn refresh_tokens(&self) -> &RefreshTokenService {
        &self.refresh_tokens
    }

    /// Authenticates with email and password and opens a session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown email or a
    /// wrong password alike.
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<AuthResponse> {
        let account = self.accounts.find_by_email(email).await?;

        let passwords = self.passwords.clone();
        let plain = password.to_string();
        let stored_hash = account.as_ref().map(|a| a.password_hash.clone());
        let verified = tokio::task::spawn_blocking(move || match stored_hash {
            Some(hash) => passwords.matches(&plain, &hash),
            None => {
                passwords.verify_dummy(&plain);
                false
            }
        })
        .await
        .map_err(|e| AuthError::internal(format!("password verification task failed: {e}")))?;

        let account = match account {
            Some(account) if verified => account,
            _ => {
                tracing::info!("Login rejected: invalid credentials");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let response = self.open_session(&account).await?;
        tracing::info!(account_id = account.id, "Login succeeded");
        Ok(response)
    }

    /// Exchanges a refresh token for a new token pair.
    ///
    /// The presented token is consumed whether or not the account still
    /// exists.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidRefreshToken` if the token is unknown,
    /// already used, expired, or owned by an account that no longer exists.
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<AuthResponse> {
        let issued = self.refresh_tokens.rotate(refresh_token).await.map_err(|e| {
            tracing::debug!(error = %e, "Refresh rejected");
            e.into_public_refresh_error()
        })?;

        let account_id = issued.record.account_id;
        let Some(account) = self.accounts.find_by_id(account_id).await? else {
            tracing::warn!(account_id, "Refresh token owner no longer exists");
            self.refresh_tokens.delete_by_token(&issued.token).await?;
            return Err(AuthError::InvalidRefreshToken);
        };

        let access_token = self.issue_access_token(&account)?;
        tracing::debug!(account_id, "Session refreshed");
        Ok(self.response(access_token, issued.token))
    }

    /// Ends a session.
    ///
    /// Both the revocation and the refresh token deletion are attempted even
    /// if the first one fails; the first error is returned.
    ///
    /// # Errors
    ///
    /// Returns the first error from revoking the access token or deleting the
    /// refresh token.
    pub async fn logout(&self, access_token: &str, refresh_token: &str) -> AuthResult<()> {
        let revoked = self.ledger.revoke(access_token).await;
        let deleted = self.refresh_tokens.delete_by_token(refresh_token).await;

        if let Err(ref e) = revoked {
            tracing::warn!(error = %e, "Logout: access token revocation failed");
        }
        if let Err(ref e) = deleted {
            tracing::warn!(error = %e, "Logout: refresh token deletion failed");
        }

        revoked?;
        deleted?;
        Ok(())
    }

    /// Ends every session of an account: revokes the presented access token
    /// and deletes all of the account's refresh tokens.
    ///
    /// # Errors
    ///
    /// Returns the first error from either step; both are always attempted.
    pub async fn logout_all(&self, access_token: &str, account_id: i64) -> AuthResult<u64> {
        let revoked = self.ledger.revoke(access_token).await;
        let deleted = self.refresh_tokens.delete_all_for_account(account_id).await;

        if let Err(ref e) = revoked {
            tracing::warn!(account_id, error = %e, "Logout-all: access token revocation failed");
        }
        if let Err(ref e) = deleted {
            tracing::warn!(account_id, error = %e, "Logout-all: refresh token deletion failed");
        }

        revoked?;
        let deleted = deleted?;
        tracing::info!(account_id, sessions = deleted, "Logged out everywhere");
        Ok(deleted)
    }

    /// Purges expired revocation records and refresh tokens.
    ///
    /// # Errors
    ///
    /// Returns the first storage error; both purges are always attempted.
    pub async fn run_maintenance(&self, now: OffsetDateTime) -> AuthResult<MaintenanceReport> {
        let revocations = self.ledger.purge_expired(now).await;
        let refresh = self.refresh_tokens.cleanup_expired(now).await;

        Ok(MaintenanceReport {
            revocations_purged: revocations?,
            refresh_tokens_purged: refresh?,
        })
    }

    /// Starts the background purge job.
    ///
    /// Failures are logged and retried on the next tick.
    pub fn start_maintenance_task(self: Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);

            loop {
                interval.tick().await;

                match self.run_maintenance(OffsetDateTime::now_utc()).await {
                    Ok(report) if report != MaintenanceReport::default() => {
                        tracing::info!(
                            revocations_purged = report.revocations_purged,
                            refresh_tokens_purged = report.refresh_tokens_purged,
                            "Token maintenance completed"
                        );
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Token maintenance failed");
                    }
                    _ => {}
                }
            }
        })
    }

    async fn open_session(&self, account: &Account) -> AuthResult<AuthResponse> {
        let access_token = self.issue_access_token(account)?;
        let refresh = self.refresh_tokens.create(account.id).await?;
        Ok(self.response(access_token, refresh.token))
    }

    fn issue_access_token(&self, account: &Account) -> AuthResult<String> {
        Ok(self.jwt.issue(
            account.id,
            &account.email,
            account.role,
            self.access_token_lifetime,
        )?)
    }

    fn response(&self, access_token: String, refresh_token: String) -> AuthResponse {
        AuthResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: u64::try_from(self.access_token_lifetime.as_millis()).unwrap_or(u64::MAX),
        }
    }
}
