use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
};
use serde_json::{Value, json};
use storefront_auth::config::EndpointLimit;
use storefront_auth::types::Role;
use storefront_server::config::SeedAccountConfig;
use storefront_server::{AppConfig, AuthServices, bootstrap, build_app};
use tower::ServiceExt;

const SECRET: &str = "integration-test-secret-at-least-32-bytes";

fn app_with(config: AppConfig) -> Router {
    let services = AuthServices::from_config(&config.auth).expect("services");
    bootstrap::seed_accounts(
        &services.accounts,
        services.passwords.as_ref(),
        &config.bootstrap,
    )
    .expect("seed accounts");
    build_app(&config, &services)
}

fn config() -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.signing.secret = SECRET.to_string();
    config.bootstrap.accounts = vec![
        SeedAccountConfig {
            email: "ana@example.com".into(),
            password: "user-pass".into(),
            role: Role::User,
        },
        SeedAccountConfig {
            email: "root@example.com".into(),
            password: "admin-pass".into(),
            role: Role::Admin,
        },
    ];
    config
}

fn request(method: &str, uri: &str, body: Option<Value>, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-forwarded-for", "198.51.100.7");
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn login(app: &Router, email: &str, password: &str) -> (String, String) {
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/auth/login",
            Some(json!({"email": email, "password": password})),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    (
        body["accessToken"].as_str().unwrap().to_string(),
        body["refreshToken"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn login_use_logout_then_token_is_dead() {
    let app = app_with(config());
    let (access, refresh) = login(&app, "ana@example.com", "user-pass").await;

    let me = app
        .clone()
        .oneshot(request("GET", "/api/me", None, Some(&access)))
        .await
        .unwrap();
    assert_eq!(me.status(), StatusCode::OK);
    assert!(me.headers().contains_key("x-rate-limit-remaining"));
    let me = json_body(me).await;
    assert_eq!(me["email"], "ana@example.com");
    assert_eq!(me["role"], "USER");

    let logout = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/auth/logout",
            Some(json!({"refreshToken": refresh})),
            Some(&access),
        ))
        .await
        .unwrap();
    assert_eq!(logout.status(), StatusCode::NO_CONTENT);

    let me_again = app
        .clone()
        .oneshot(request("GET", "/api/me", None, Some(&access)))
        .await
        .unwrap();
    assert_eq!(me_again.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(me_again).await["message"], "Token revoked");

    let refreshed = app
        .oneshot(request(
            "POST",
            "/api/auth/refresh",
            Some(json!({"refreshToken": refresh})),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(refreshed.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(refreshed).await["message"], "Invalid refresh token");
}

#[tokio::test]
async fn refresh_rotates_and_rejects_replay() {
    let app = app_with(config());
    let (_, refresh) = login(&app, "ana@example.com", "user-pass").await;

    let first = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/auth/refresh",
            Some(json!({"refreshToken": refresh})),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let rotated = json_body(first).await;
    assert_ne!(rotated["refreshToken"].as_str().unwrap(), refresh);

    let new_access = rotated["accessToken"].as_str().unwrap();
    let me = app
        .clone()
        .oneshot(request("GET", "/api/me", None, Some(new_access)))
        .await
        .unwrap();
    assert_eq!(me.status(), StatusCode::OK);

    let replay = app
        .oneshot(request(
            "POST",
            "/api/auth/refresh",
            Some(json!({"refreshToken": refresh})),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_route_checks_role() {
    let app = app_with(config());
    let (user_token, _) = login(&app, "ana@example.com", "user-pass").await;
    let (admin_token, _) = login(&app, "root@example.com", "admin-pass").await;

    let anonymous = app
        .clone()
        .oneshot(request("GET", "/api/admin/ping", None, None))
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let user = app
        .clone()
        .oneshot(request("GET", "/api/admin/ping", None, Some(&user_token)))
        .await
        .unwrap();
    assert_eq!(user.status(), StatusCode::FORBIDDEN);

    let admin = app
        .oneshot(request("GET", "/api/admin/ping", None, Some(&admin_token)))
        .await
        .unwrap();
    assert_eq!(admin.status(), StatusCode::OK);
}

#[tokio::test]
async fn malformed_token_is_rejected_on_public_route() {
    let app = app_with(config());

    let health = app
        .clone()
        .oneshot(request("GET", "/api/health", None, None))
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);

    let forged = app
        .oneshot(request("GET", "/api/health", None, Some("not-a-token")))
        .await
        .unwrap();
    assert_eq!(forged.status(), StatusCode::UNAUTHORIZED);
    assert!(forged.headers().contains_key(header::WWW_AUTHENTICATE));
}

#[tokio::test]
async fn login_endpoint_is_rate_limited() {
    let mut config = config();
    config.auth.rate_limiting.endpoints = vec![EndpointLimit {
        prefix: "POST:/api/auth/login".into(),
        requests_per_minute: 2,
    }];
    let app = app_with(config);

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/auth/login",
                Some(json!({"email": "ana@example.com", "password": "wrong"})),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let limited = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/auth/login",
            Some(json!({"email": "ana@example.com", "password": "user-pass"})),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(limited.headers().get("x-rate-limit-remaining").unwrap(), "0");
    assert_eq!(
        json_body(limited).await["message"],
        "Rate limit exceeded. Try again later."
    );

    // Other endpoints keep their own budget.
    let health = app
        .oneshot(request("GET", "/api/health", None, None))
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);
}

#[tokio::test]
async fn logout_all_ends_every_session() {
    let app = app_with(config());
    let (access, _) = login(&app, "ana@example.com", "user-pass").await;
    let (_, other_refresh) = login(&app, "ana@example.com", "user-pass").await;

    let response = app
        .clone()
        .oneshot(request("POST", "/api/auth/logout-all", None, Some(&access)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let refreshed = app
        .oneshot(request(
            "POST",
            "/api/auth/refresh",
            Some(json!({"refreshToken": other_refresh})),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(refreshed.status(), StatusCode::UNAUTHORIZED);
}

#[test]
fn weak_signing_secret_fails_startup() {
    let mut config = config();
    config.auth.signing.secret = "short".into();
    let err = AuthServices::from_config(&config.auth).err().expect("weak secret");
    assert!(matches!(
        err,
        storefront_auth::AuthError::SigningKeyMisconfigured { .. }
    ));
}
