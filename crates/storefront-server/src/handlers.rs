use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use storefront_auth::middleware::{AdminAuth, BearerAuth};
use storefront_auth::types::Role;
use time::OffsetDateTime;

#[derive(Serialize)]
pub struct HealthResponse<'a> {
    status: &'a str,
    version: &'a str,
}

/// Identity of the caller, as seen by the authentication gate.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub id: i64,
    pub email: String,
    pub role: Role,
    #[serde(with = "time::serde::rfc3339::option")]
    pub expires_at: Option<OffsetDateTime>,
}

pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}

pub async fn me(BearerAuth(auth): BearerAuth) -> impl IntoResponse {
    Json(MeResponse {
        id: auth.account_id(),
        email: auth.subject().to_string(),
        role: auth.role(),
        expires_at: auth.expires_at(),
    })
}

pub async fn admin_ping(AdminAuth(admin): AdminAuth) -> impl IntoResponse {
    tracing::debug!(account_id = admin.account_id(), "Admin ping");
    Json(serde_json::json!({ "pong": true }))
}
