//! Authentication context types.
//!
//! This module provides the identity context the authentication gate
//! attaches to each request carrying a valid bearer token.

use std::sync::Arc;

use time::OffsetDateTime;

use crate::token::AccessTokenClaims;
use crate::types::Role;

/// Authenticated request context.
///
/// Inserted into request extensions by the authentication gate and read by
/// the `BearerAuth`, `OptionalBearerAuth` and `AdminAuth` extractors.
///
/// The `claims` field is wrapped in `Arc` so the context can be cloned
/// cheaply across handlers and extractors.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Validated access token claims.
    pub claims: Arc<AccessTokenClaims>,

    /// Raw bearer token, needed to revoke it on logout.
    pub token: String,
}

impl AuthContext {
    /// Creates a context from validated claims and the raw token.
    #[must_use]
    pub fn new(claims: AccessTokenClaims, token: impl Into<String>) -> Self {
        Self {
            claims: Arc::new(claims),
            token: token.into(),
        }
    }

    /// Returns the account identifier.
    #[inline]
    #[must_use]
    pub fn account_id(&self) -> i64 {
        self.claims.id
    }

    /// Returns the subject (account email).
    #[inline]
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.claims.sub
    }

    /// Returns the role claim.
    #[inline]
    #[must_use]
    pub fn role(&self) -> Role {
        self.claims.role
    }

    /// Returns the token's JWT ID.
    #[inline]
    #[must_use]
    pub fn jti(&self) -> &str {
        &self.claims.jti
    }

    /// Returns `true` if the account holds `role`.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.claims.role == role
    }

    /// Returns `true` for administrators.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    /// Returns the token expiration time.
    #[must_use]
    pub fn expires_at(&self) -> Option<OffsetDateTime> {
        self.claims.expires_at()
    }
}
