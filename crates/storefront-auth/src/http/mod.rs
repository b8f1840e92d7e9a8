//! HTTP handlers for the session endpoints.
//!
//! # Available Handlers
//!
//! - [`auth`] - Login, refresh, logout and password reset

pub mod auth;

pub use auth::{
    AuthHttpState, ForgotPasswordRequest, LoginRequest, RefreshTokenRequest, ResetPasswordRequest,
    auth_router, forgot_password_handler, login_handler, logout_all_handler, logout_handler,
    refresh_handler, reset_password_handler,
};
