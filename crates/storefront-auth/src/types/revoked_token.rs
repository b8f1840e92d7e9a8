//! Revocation ledger record.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A revoked access token, identified by the hash of its raw encoding.
///
/// The record is kept until the token would have expired on its own, after
/// which the purge job removes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokedTokenRecord {
    /// SHA-256 hex hash of the raw token.
    pub token_hash: String,

    /// When the token was revoked.
    #[serde(with = "time::serde::rfc3339")]
    pub revoked_at: OffsetDateTime,

    /// The token's own expiry.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl RevokedTokenRecord {
    /// Returns `true` once the record may be purged.
    #[must_use]
    pub fn is_purgeable_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at < now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    #[test]
    fn test_purgeable_only_strictly_after_expiry() {
        let now = OffsetDateTime::now_utc();
        let record = RevokedTokenRecord {
            token_hash: "h".to_string(),
            revoked_at: now - Duration::minutes(5),
            expires_at: now,
        };

        assert!(!record.is_purgeable_at(now - Duration::seconds(1)));
        assert!(!record.is_purgeable_at(now));
        assert!(record.is_purgeable_at(now + Duration::seconds(1)));
    }
}
