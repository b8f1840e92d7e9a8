//! HTTP middleware for admission control and authentication.
//!
//! This module provides Axum middleware for:
//!
//! - Per-client, per-endpoint rate limiting ([`rate_limit`])
//! - Single-pass bearer token authentication ([`authentication_gate`])
//! - Identity extractors for handlers
//! - JSON error responses for [`AuthError`](crate::AuthError)
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, middleware, routing::get};
//! use storefront_auth::middleware::{BearerAuth, authentication_gate, rate_limit};
//!
//! async fn protected_handler(BearerAuth(auth): BearerAuth) -> String {
//!     format!("Hello, {}!", auth.subject())
//! }
//!
//! let app = Router::new()
//!     .route("/protected", get(protected_handler))
//!     .layer(middleware::from_fn_with_state(auth_state, authentication_gate))
//!     .layer(middleware::from_fn_with_state(limiter, rate_limit));
//! ```

pub mod admin;
pub mod admission;
pub mod auth;
pub mod error;
pub mod gate;
pub mod types;

pub use admin::AdminAuth;
pub use admission::{client_identity, rate_limit};
pub use auth::{AuthState, BearerAuth, OptionalBearerAuth, bearer_token};
pub use error::{RATE_LIMIT_MESSAGE, RATE_LIMIT_REMAINING_HEADER, error_body};
pub use gate::authentication_gate;
pub use types::AuthContext;
