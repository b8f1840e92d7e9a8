//! Password reset token record.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::secret::{generate_token, hash_token};

/// A single-use password reset token. Only the hash is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetToken {
    /// SHA-256 hash of the emailed token.
    pub token_hash: String,

    /// Account whose password may be reset.
    pub account_id: i64,

    /// When the token stops being accepted.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl PasswordResetToken {
    /// Creates a new reset record and returns it with the plaintext token.
    #[must_use]
    pub fn issue(account_id: i64, now: OffsetDateTime, lifetime: time::Duration) -> (String, Self) {
        let token = generate_token();
        let record = Self {
            token_hash: hash_token(&token),
            account_id,
            expires_at: now + lifetime,
        };
        (token, record)
    }

    /// Returns `true` if this token has expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now > self.expires_at
    }
}
