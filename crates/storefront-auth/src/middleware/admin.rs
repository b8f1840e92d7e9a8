//! Admin authorization extractor.
//!
//! # Example
//!
//! ```ignore
//! use storefront_auth::middleware::AdminAuth;
//!
//! async fn admin_handler(AdminAuth(admin): AdminAuth) -> String {
//!     format!("Hello admin {}!", admin.subject())
//! }
//! ```

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AuthError;

use super::auth::BearerAuth;
use super::types::AuthContext;

/// Identity of an authenticated administrator.
///
/// Rejects anonymous requests with 401 and authenticated non-admins with
/// 403.
#[derive(Debug, Clone)]
pub struct AdminAuth(pub AuthContext);

impl<S> FromRequestParts<S> for AdminAuth
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let BearerAuth(auth) = BearerAuth::from_request_parts(parts, state).await?;

        if !auth.is_admin() {
            tracing::debug!(
                account_id = auth.account_id(),
                role = %auth.role(),
                "Admin access denied: insufficient role"
            );
            return Err(AuthError::forbidden("Admin role required"));
        }

        Ok(AdminAuth(auth))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;
    use crate::token::AccessTokenClaims;
    use crate::types::Role;

    fn parts_with(role: Option<Role>) -> Parts {
        let (mut parts, _) = Request::new(()).into_parts();
        if let Some(role) = role {
            parts.extensions.insert(AuthContext::new(
                AccessTokenClaims {
                    sub: "root@example.com".to_string(),
                    id: 1,
                    role,
                    iat: 0,
                    exp: i64::MAX,
                    jti: "j".to_string(),
                },
                "raw",
            ));
        }
        parts
    }

    #[tokio::test]
    async fn test_admin_allowed() {
        let mut parts = parts_with(Some(Role::Admin));
        assert!(AdminAuth::from_request_parts(&mut parts, &()).await.is_ok());
    }

    #[tokio::test]
    async fn test_user_forbidden() {
        let mut parts = parts_with(Some(Role::User));
        let err = AdminAuth::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert!(matches!(err, AuthError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_anonymous_unauthorized() {
        let mut parts = parts_with(None);
        let err = AdminAuth::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized { .. }));
    }
}
