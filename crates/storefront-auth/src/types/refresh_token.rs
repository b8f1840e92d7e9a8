//! Refresh token domain type.
//!
//! # Security
//!
//! - Refresh tokens are stored as SHA-256 hashes, never plaintext
//! - Each token is single-use: a refresh consumes it and issues a replacement
//! - Expired tokens are deleted when detected and by the periodic cleanup

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::secret::{generate_token, hash_token};

/// Refresh token record held by the refresh token store.
///
/// The plaintext value is handed to the caller once, at creation, and only
/// its hash is persisted. Lookups hash the presented value first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshToken {
    /// SHA-256 hash of the actual token value.
    pub token_hash: String,

    /// Account that owns this token.
    pub account_id: i64,

    /// When this token was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// When this token expires.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl RefreshToken {
    /// Creates a new record for `account_id` and returns it together with
    /// the plaintext token.
    #[must_use]
    pub fn issue(
        account_id: i64,
        now: OffsetDateTime,
        lifetime: time::Duration,
    ) -> (String, Self) {
        let token = generate_token();
        let record = Self {
            token_hash: hash_token(&token),
            account_id,
            created_at: now,
            expires_at: now + lifetime,
        };
        (token, record)
    }

    /// Returns `true` if this token has expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now > self.expires_at
    }

    /// Returns `true` if this token has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(OffsetDateTime::now_utc())
    }
}
