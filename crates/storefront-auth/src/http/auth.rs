//! Session and password reset endpoints.
//!
//! | Method | Path                         | Auth     | Success |
//! |--------|------------------------------|----------|---------|
//! | POST   | `/api/auth/login`            | none     | 200     |
//! | POST   | `/api/auth/refresh`          | none     | 200     |
//! | POST   | `/api/auth/logout`           | bearer   | 204     |
//! | POST   | `/api/auth/logout-all`       | bearer   | 204     |
//! | POST   | `/api/auth/forgot-password`  | none     | 200     |
//! | POST   | `/api/auth/reset-password`   | none     | 200     |
//!
//! The bearer routes rely on the authentication gate running in front of
//! this router.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::post,
};
use serde::Deserialize;

use crate::error::AuthError;
use crate::middleware::BearerAuth;
use crate::password_reset::PasswordResetService;
use crate::session::{AuthResponse, SessionService};

/// State for the auth endpoints.
#[derive(Clone)]
pub struct AuthHttpState {
    /// Session orchestrator.
    pub sessions: Arc<SessionService>,

    /// Password reset flow.
    pub resets: Arc<PasswordResetService>,
}

impl AuthHttpState {
    /// Creates a new state.
    pub fn new(sessions: Arc<SessionService>, resets: Arc<PasswordResetService>) -> Self {
        Self { sessions, resets }
    }
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Login email.
    pub email: String,
    /// Plaintext password.
    pub password: String,
}

/// Body carrying a refresh token (refresh and logout).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    /// Opaque refresh token from login or a previous refresh.
    pub refresh_token: String,
}

/// Password reset request body.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    /// Account email.
    pub email: String,
}

/// Password reset redemption body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    /// Reset token delivered to the account owner.
    pub token: String,
    /// New plaintext password.
    pub new_password: String,
}

/// Builds the `/api/auth` router.
pub fn auth_router(state: AuthHttpState) -> Router {
    Router::new()
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/refresh", post(refresh_handler))
        .route("/api/auth/logout", post(logout_handler))
        .route("/api/auth/logout-all", post(logout_all_handler))
        .route("/api/auth/forgot-password", post(forgot_password_handler))
        .route("/api/auth/reset-password", post(reset_password_handler))
        .with_state(state)
}

/// `POST /api/auth/login`
pub async fn login_handler(
    State(state): State<AuthHttpState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AuthError::invalid_request("Email and password are required"));
    }

    let response = state.sessions.login(req.email.trim(), &req.password).await?;
    Ok(Json(response))
}

/// `POST /api/auth/refresh`
pub async fn refresh_handler(
    State(state): State<AuthHttpState>,
    Json(req): Json<RefreshTokenRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    if req.refresh_token.trim().is_empty() {
        return Err(AuthError::invalid_request("Refresh token is required"));
    }

    let response = state.sessions.refresh(&req.refresh_token).await?;
    Ok(Json(response))
}

/// `POST /api/auth/logout`
pub async fn logout_handler(
    State(state): State<AuthHttpState>,
    BearerAuth(auth): BearerAuth,
    Json(req): Json<RefreshTokenRequest>,
) -> Result<StatusCode, AuthError> {
    state.sessions.logout(&auth.token, &req.refresh_token).await?;
    tracing::info!(account_id = auth.account_id(), "Logged out");
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/auth/logout-all`
pub async fn logout_all_handler(
    State(state): State<AuthHttpState>,
    BearerAuth(auth): BearerAuth,
) -> Result<StatusCode, AuthError> {
    state
        .sessions
        .logout_all(&auth.token, auth.account_id())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/auth/forgot-password`
///
/// Always answers 200 for a well-formed request, whether or not the email
/// is registered.
pub async fn forgot_password_handler(
    State(state): State<AuthHttpState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<StatusCode, AuthError> {
    if req.email.trim().is_empty() {
        return Err(AuthError::invalid_request("Email is required"));
    }

    state.resets.request_reset(req.email.trim()).await?;
    Ok(StatusCode::OK)
}

/// `POST /api/auth/reset-password`
pub async fn reset_password_handler(
    State(state): State<AuthHttpState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<StatusCode, AuthError> {
    state
        .resets
        .reset_password(&req.token, &req.new_password)
        .await?;
    Ok(StatusCode::OK)
}
