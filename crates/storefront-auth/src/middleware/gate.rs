//! Authentication gate.
//!
//! Runs once per request before any handler. Requests without a bearer
//! token pass through anonymously. Requests with a token either get an
//! [`AuthContext`](super::AuthContext) in their extensions or are rejected
//! with 401.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::auth::{AuthState, bearer_token};

/// Axum middleware that authenticates bearer tokens.
///
/// Install with `axum::middleware::from_fn_with_state(auth_state, authentication_gate)`.
pub async fn authentication_gate(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(req.headers()) else {
        return next.run(req).await;
    };

    match state.authenticate(token).await {
        Ok(ctx) => {
            req.extensions_mut().insert(ctx);
            next.run(req).await
        }
        Err(e) => {
            tracing::info!(
                error = %e,
                path = %req.uri().path(),
                "Bearer token rejected"
            );
            e.into_response()
        }
    }
}
