//! Bearer token authentication.
//!
//! [`AuthState`] performs the single-pass token check used by the
//! authentication gate. The extractors in this module read the
//! [`AuthContext`] the gate stored in request extensions; they never decode
//! the token a second time.
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, middleware, routing::get};
//! use storefront_auth::middleware::{AuthState, BearerAuth, authentication_gate};
//!
//! async fn protected_handler(BearerAuth(auth): BearerAuth) -> String {
//!     format!("Hello, {}!", auth.subject())
//! }
//!
//! let app = Router::new()
//!     .route("/protected", get(protected_handler))
//!     .layer(middleware::from_fn_with_state(auth_state, authentication_gate));
//! ```

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use time::OffsetDateTime;

use crate::error::AuthError;
use crate::token::{JwtError, JwtService, RevocationLedger};

use super::types::AuthContext;

/// State required for bearer token authentication.
#[derive(Clone)]
pub struct AuthState {
    /// Access token codec.
    pub jwt_service: Arc<JwtService>,

    /// Revocation ledger consulted after a successful decode.
    pub ledger: RevocationLedger,
}

impl AuthState {
    /// Creates a new auth state.
    pub fn new(jwt_service: Arc<JwtService>, ledger: RevocationLedger) -> Self {
        Self {
            jwt_service,
            ledger,
        }
    }

    /// Validates a raw bearer token and builds its identity context.
    ///
    /// # Errors
    ///
    /// - `AuthError::ExpiredToken` if the token is past its expiry
    /// - `AuthError::InvalidSignature` if the token cannot be verified
    /// - `AuthError::RevokedToken` if the token was revoked
    pub async fn authenticate(&self, token: &str) -> Result<AuthContext, AuthError> {
        self.authenticate_at(token, OffsetDateTime::now_utc()).await
    }

    /// [`AuthState::authenticate`] with an explicit `now`.
    ///
    /// # Errors
    ///
    /// See [`AuthState::authenticate`].
    pub async fn authenticate_at(
        &self,
        token: &str,
        now: OffsetDateTime,
    ) -> Result<AuthContext, AuthError> {
        let claims = self.jwt_service.decode_at(token, now).map_err(|e| {
            match &e {
                JwtError::Expired => tracing::debug!("Rejected expired access token"),
                other => tracing::debug!(error = %other, "Rejected unverifiable access token"),
            }
            AuthError::from(e)
        })?;

        if self.ledger.is_revoked(token).await? {
            tracing::debug!(jti = %claims.jti, account_id = claims.id, "Rejected revoked access token");
            return Err(AuthError::RevokedToken);
        }

        tracing::debug!(
            account_id = claims.id,
            role = %claims.role,
            "Token validated successfully"
        );

        Ok(AuthContext::new(claims, token))
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
///
/// Returns `None` when the header is absent, uses another scheme, or
/// carries an empty token.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Axum extractor for the authenticated identity.
///
/// Reads the [`AuthContext`] the authentication gate stored for this
/// request.
///
/// # Errors
///
/// Rejects with `AuthError::Unauthorized` (401) when the request is
/// anonymous.
pub struct BearerAuth(pub AuthContext);

impl<S> FromRequestParts<S> for BearerAuth
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(BearerAuth)
            .ok_or_else(|| AuthError::unauthorized("Authentication required"))
    }
}

/// Axum extractor that yields the identity if there is one.
///
/// Never rejects. Anonymous requests produce `None`.
pub struct OptionalBearerAuth(pub Option<AuthContext>);

impl<S> FromRequestParts<S> for OptionalBearerAuth
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalBearerAuth(parts.extensions.get::<AuthContext>().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderValue, Request};

    use super::*;
    use crate::storage::InMemoryRevokedTokenStorage;
    use crate::token::SigningKey;
    use crate::types::Role;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    fn auth_state() -> AuthState {
        let jwt = Arc::new(JwtService::new(SigningKey::from_secret(SECRET).unwrap()));
        let ledger = RevocationLedger::new(Arc::new(InMemoryRevokedTokenStorage::new()), jwt.clone());
        AuthState::new(jwt, ledger)
    }

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&headers("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("Basic abc")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn test_authenticate_valid_token() {
        let state = auth_state();
        let token = state
            .jwt_service
            .issue(3, "ana@example.com", Role::Admin, std::time::Duration::from_secs(60))
            .unwrap();

        let ctx = state.authenticate(&token).await.unwrap();
        assert_eq!(ctx.account_id(), 3);
        assert!(ctx.is_admin());
    }

    #[tokio::test]
    async fn test_authenticate_expired_token() {
        let state = auth_state();
        let now = OffsetDateTime::now_utc();
        let token = state
            .jwt_service
            .issue_at(3, "ana@example.com", Role::User, std::time::Duration::from_secs(60), now)
            .unwrap();

        let err = state
            .authenticate_at(&token, now + time::Duration::seconds(61))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::ExpiredToken));
    }

    #[tokio::test]
    async fn test_authenticate_garbage_token() {
        let err = auth_state().authenticate("not.a.jwt").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidSignature));
    }

    #[tokio::test]
    async fn test_authenticate_revoked_token() {
        let state = auth_state();
        let token = state
            .jwt_service
            .issue(3, "ana@example.com", Role::User, std::time::Duration::from_secs(60))
            .unwrap();
        state.ledger.revoke(&token).await.unwrap();

        let err = state.authenticate(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::RevokedToken));
    }

    #[tokio::test]
    async fn test_extractors_read_extensions() {
        let state = auth_state();
        let token = state
            .jwt_service
            .issue(3, "ana@example.com", Role::User, std::time::Duration::from_secs(60))
            .unwrap();
        let ctx = state.authenticate(&token).await.unwrap();

        let (mut anonymous, _) = Request::new(()).into_parts();
        assert!(BearerAuth::from_request_parts(&mut anonymous, &()).await.is_err());
        let OptionalBearerAuth(none) = OptionalBearerAuth::from_request_parts(&mut anonymous, &())
            .await
            .unwrap();
        assert!(none.is_none());

        let (mut parts, _) = Request::new(()).into_parts();
        parts.extensions.insert(ctx);
        let BearerAuth(found) = BearerAuth::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(found.subject(), "ana@example.com");
    }
}
