//! Admission control middleware.
//!
//! Charges every request against the token bucket for its client and
//! endpoint. Rejected requests get 429 with `X-Rate-Limit-Remaining: 0`;
//! admitted requests carry the remaining budget on their response.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::AuthError;
use crate::rate_limit::{BucketKey, Decision, RateLimiter};

use super::error::RATE_LIMIT_REMAINING_HEADER;

/// Best-effort client identity.
///
/// Prefers the first `X-Forwarded-For` entry, then the peer address. The
/// header is client-controlled, so this must never be used as an
/// authentication signal.
#[must_use]
pub fn client_identity(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for")
        && let Ok(value) = forwarded.to_str()
        && let Some(first_ip) = value.split(',').next()
    {
        let ip = first_ip.trim();
        if !ip.is_empty() {
            return ip.to_string();
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Axum middleware that enforces the rate limit.
///
/// Install with `axum::middleware::from_fn_with_state(limiter, rate_limit)`.
/// The peer address is read from `ConnectInfo<SocketAddr>` when the server
/// was started with `into_make_service_with_connect_info`.
pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request,
    next: Next,
) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_identity(req.headers(), peer);
    let key = BucketKey::new(client, req.method().as_str(), req.uri().path());

    match limiter.try_consume(key.clone()) {
        Decision::Allowed { remaining } => {
            let mut response = next.run(req).await;
            response
                .headers_mut()
                .insert(RATE_LIMIT_REMAINING_HEADER, HeaderValue::from(remaining));
            response
        }
        Decision::Rejected { retry_after } => {
            tracing::debug!(
                client = %key.client,
                endpoint = %key.endpoint,
                retry_after_ms = u64::try_from(retry_after.as_millis()).unwrap_or(u64::MAX),
                "Rate limit exceeded"
            );
            AuthError::RateLimitExceeded.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
        middleware,
        routing::get,
    };
    use tower::ServiceExt;

    use super::*;
    use crate::config::{EndpointLimit, RateLimitingConfig};

    fn app(limiter: Arc<RateLimiter>) -> Router {
        Router::new()
            .route("/products", get(|| async { "ok" }))
            .route("/login", get(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(limiter, rate_limit))
    }

    fn limiter() -> Arc<RateLimiter> {
        Arc::new(RateLimiter::from_config(&RateLimitingConfig {
            default_requests_per_minute: 3,
            endpoints: vec![EndpointLimit {
                prefix: "GET:/login".to_string(),
                requests_per_minute: 1,
            }],
            ..RateLimitingConfig::default()
        }))
    }

    fn request(uri: &str, forwarded_for: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("x-forwarded-for", forwarded_for)
            .body(Body::empty())
            .unwrap()
    }

    fn remaining(response: &Response) -> &str {
        response
            .headers()
            .get(RATE_LIMIT_REMAINING_HEADER)
            .unwrap()
            .to_str()
            .unwrap()
    }

    #[test]
    fn test_client_identity_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9, 10.0.0.1"));
        let peer: SocketAddr = "192.168.1.5:4000".parse().unwrap();

        assert_eq!(client_identity(&headers, Some(peer)), "203.0.113.9");
        assert_eq!(client_identity(&HeaderMap::new(), Some(peer)), "192.168.1.5");
        assert_eq!(client_identity(&HeaderMap::new(), None), "unknown");
    }

    #[tokio::test]
    async fn test_remaining_header_counts_down_then_rejects() {
        let app = app(limiter());

        for expected in ["2", "1", "0"] {
            let response = app.clone().oneshot(request("/products", "1.1.1.1")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(remaining(&response), expected);
        }

        let response = app.oneshot(request("/products", "1.1.1.1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(remaining(&response), "0");
    }

    #[tokio::test]
    async fn test_endpoint_limit_and_client_isolation() {
        let app = app(limiter());

        let first = app.clone().oneshot(request("/login", "1.1.1.1")).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        let second = app.clone().oneshot(request("/login", "1.1.1.1")).await.unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);

        let other_client = app.oneshot(request("/login", "2.2.2.2")).await.unwrap();
        assert_eq!(other_client.status(), StatusCode::OK);
    }
}
