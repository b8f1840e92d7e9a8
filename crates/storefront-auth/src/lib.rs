//! # storefront-auth
//!
//! Credential and session lifecycle for the storefront API.
//!
//! This crate provides:
//! - Signing key validation and HS256 access tokens
//! - Single-use rotating refresh tokens
//! - An access token revocation ledger with periodic purge
//! - Login, refresh and logout orchestration
//! - Password reset tokens
//! - Token-bucket rate limiting
//! - Axum middleware for admission control and authentication
//!
//! ## Overview
//!
//! Requests pass through the admission controller ([`middleware::rate_limit`])
//! and then the authentication gate ([`middleware::authentication_gate`])
//! before reaching handlers. Login, refresh and logout go through
//! [`SessionService`], which drives the token codec, the refresh token store
//! and the revocation ledger.
//!
//! ## Modules
//!
//! - [`config`] - Token lifetimes, signing secret and rate limit tables
//! - [`token`] - Signing key, access token codec, refresh tokens, revocation
//! - [`session`] - Login, refresh, logout and background maintenance
//! - [`password_reset`] - Password reset token flow
//! - [`rate_limit`] - Token-bucket admission control
//! - [`middleware`] - HTTP middleware and extractors
//! - [`storage`] - Storage traits and in-memory implementations
//! - [`http`] - Axum HTTP handlers for the auth endpoints

pub mod config;
pub mod error;
pub mod http;
pub mod middleware;
pub mod password;
pub mod password_reset;
pub mod rate_limit;
pub mod session;
pub mod storage;
pub mod token;
pub mod types;

pub use config::{AuthConfig, ConfigError};
pub use error::{AuthError, ErrorCategory};
pub use http::{AuthHttpState, auth_router};
pub use middleware::{
    AdminAuth, AuthContext, AuthState, BearerAuth, OptionalBearerAuth, authentication_gate,
    rate_limit,
};
pub use password::{Argon2PasswordVerifier, PasswordVerifier};
pub use password_reset::{LoggingResetNotifier, PasswordResetService, ResetNotifier};
pub use rate_limit::{BucketKey, Decision, RateLimiter};
pub use session::{AuthResponse, MaintenanceReport, SessionService};
pub use storage::{
    AccountDirectory, PasswordResetStorage, RefreshTokenStorage, RevokedTokenStorage,
};
pub use token::{JwtService, RefreshTokenService, RevocationLedger, SigningKey};
pub use types::{Account, RefreshToken, Role};

/// Type alias for authentication/authorization results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use storefront_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::config::{AuthConfig, ConfigError};
    pub use crate::error::{AuthError, ErrorCategory};
    pub use crate::middleware::{
        AdminAuth, AuthContext, AuthState, BearerAuth, OptionalBearerAuth,
    };
    pub use crate::session::{AuthResponse, SessionService};
    pub use crate::storage::{AccountDirectory, RefreshTokenStorage, RevokedTokenStorage};
    pub use crate::types::{Account, RefreshToken, Role};
}
