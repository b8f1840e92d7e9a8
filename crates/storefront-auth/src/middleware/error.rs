//! Error response handling for authentication middleware.
//!
//! This module implements `IntoResponse` for `AuthError`. Every error body
//! has the shape `{"error": <code>, "message": <public message>}`.

use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::AuthError;

/// Remaining-quota header set by the admission controller.
pub const RATE_LIMIT_REMAINING_HEADER: &str = "x-rate-limit-remaining";

/// Body message for rate-limit rejections.
pub const RATE_LIMIT_MESSAGE: &str = "Rate limit exceeded. Try again later.";

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = error_details(&self);
        let code = self.error_code();

        if status.is_server_error() {
            tracing::error!(
                error = %self,
                category = %self.category(),
                "Request failed with server error"
            );
        }

        let mut headers = HeaderMap::new();

        if status == StatusCode::UNAUTHORIZED {
            let www_auth = build_www_authenticate_header(code, &message);
            if let Ok(value) = HeaderValue::from_str(&www_auth) {
                headers.insert(header::WWW_AUTHENTICATE, value);
            }
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            headers.insert(RATE_LIMIT_REMAINING_HEADER, HeaderValue::from_static("0"));
        }

        (status, headers, Json(error_body(code, &message))).into_response()
    }
}

/// Extracts the HTTP status and the client-facing message.
///
/// Server-side failures never expose their internal detail.
fn error_details(error: &AuthError) -> (StatusCode, String) {
    match error {
        AuthError::InvalidCredentials
        | AuthError::ExpiredToken
        | AuthError::InvalidSignature
        | AuthError::RevokedToken
        | AuthError::InvalidRefreshToken => (StatusCode::UNAUTHORIZED, error.to_string()),
        AuthError::RefreshTokenNotFound | AuthError::RefreshTokenExpired => (
            StatusCode::UNAUTHORIZED,
            AuthError::InvalidRefreshToken.to_string(),
        ),
        AuthError::Unauthorized { message } => (StatusCode::UNAUTHORIZED, message.clone()),
        AuthError::Forbidden { message } => (StatusCode::FORBIDDEN, message.clone()),
        AuthError::InvalidRequest { message } => (StatusCode::BAD_REQUEST, message.clone()),
        AuthError::InvalidPasswordResetToken => (StatusCode::BAD_REQUEST, error.to_string()),
        AuthError::RateLimitExceeded => {
            (StatusCode::TOO_MANY_REQUESTS, RATE_LIMIT_MESSAGE.to_string())
        }
        AuthError::SigningKeyMisconfigured { .. }
        | AuthError::Storage { .. }
        | AuthError::Internal { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        ),
    }
}

/// Builds the WWW-Authenticate header value for 401 responses.
///
/// Format: `Bearer realm="storefront", error="invalid_token", error_description="..."`
fn build_www_authenticate_header(error: &str, description: &str) -> String {
    let escaped_desc = description.replace('\"', "\\\"");
    format!(
        "Bearer realm=\"storefront\", error=\"{}\", error_description=\"{}\"",
        error, escaped_desc
    )
}

/// Creates the JSON error body used by every auth error response.
#[must_use]
pub fn error_body(code: &str, message: &str) -> serde_json::Value {
    json!({
        "error": code,
        "message": message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_unauthorized_response() {
        let response = AuthError::unauthorized("Authentication required").into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let www_auth = response
            .headers()
            .get(header::WWW_AUTHENTICATE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(www_auth.starts_with("Bearer"));
        assert!(www_auth.contains("realm=\"storefront\""));
        assert!(www_auth.contains("error=\"unauthorized\""));
    }

    #[tokio::test]
    async fn test_token_errors_have_distinct_messages() {
        let expired = body_json(AuthError::ExpiredToken.into_response()).await;
        let invalid = body_json(AuthError::InvalidSignature.into_response()).await;
        let revoked = body_json(AuthError::RevokedToken.into_response()).await;

        assert_eq!(expired["message"], "Token expired");
        assert_eq!(invalid["message"], "Invalid token signature");
        assert_eq!(revoked["message"], "Token revoked");
        assert_eq!(expired["error"], "token_expired");
    }

    #[tokio::test]
    async fn test_refresh_failures_are_uniform() {
        let not_found = AuthError::RefreshTokenNotFound.into_response();
        assert_eq!(not_found.status(), StatusCode::UNAUTHORIZED);
        let not_found = body_json(not_found).await;
        let expired = body_json(AuthError::RefreshTokenExpired.into_response()).await;

        assert_eq!(not_found, expired);
        assert_eq!(not_found["message"], "Invalid refresh token");
    }

    #[tokio::test]
    async fn test_forbidden_response() {
        let response = AuthError::forbidden("Admin role required").into_response();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(!response.headers().contains_key(header::WWW_AUTHENTICATE));
    }

    #[tokio::test]
    async fn test_rate_limit_response() {
        let response = AuthError::RateLimitExceeded.into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(RATE_LIMIT_REMAINING_HEADER).unwrap(), "0");
        let json = body_json(response).await;
        assert_eq!(json["message"], RATE_LIMIT_MESSAGE);
    }

    #[tokio::test]
    async fn test_server_error_hides_detail() {
        let response = AuthError::storage("connection refused to 10.0.0.5").into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["error"], "server_error");
        assert!(!json["message"].as_str().unwrap().contains("10.0.0.5"));
    }

    #[test]
    fn test_www_authenticate_header_escaping() {
        let header = build_www_authenticate_header("invalid_token", "Token contains \"quotes\"");
        assert!(header.contains("\\\"quotes\\\""));
    }
}
