use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, middleware, routing::get};
use storefront_auth::config::AuthConfig;
use storefront_auth::middleware::{AuthState, authentication_gate, rate_limit};
use storefront_auth::password::Argon2PasswordVerifier;
use storefront_auth::password_reset::{LoggingResetNotifier, PasswordResetService};
use storefront_auth::rate_limit::RateLimiter;
use storefront_auth::session::SessionService;
use storefront_auth::storage::{
    InMemoryAccountDirectory, InMemoryPasswordResetStorage, InMemoryRefreshTokenStorage,
    InMemoryRevokedTokenStorage,
};
use storefront_auth::token::{JwtService, RefreshTokenService, RevocationLedger, SigningKey};
use storefront_auth::{AuthError, AuthHttpState, auth_router};
use tokio::task::JoinHandle;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::{bootstrap, config::AppConfig, handlers};

/// Errors raised while assembling the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("auth initialization failed: {0}")]
    Auth(#[from] AuthError),
}

/// Long-lived auth components shared by the router and background tasks.
#[derive(Clone)]
pub struct AuthServices {
    pub accounts: Arc<InMemoryAccountDirectory>,
    pub passwords: Arc<Argon2PasswordVerifier>,
    pub sessions: Arc<SessionService>,
    pub resets: Arc<PasswordResetService>,
    pub limiter: Arc<RateLimiter>,
    pub auth_state: AuthState,
}

impl AuthServices {
    /// Wires the in-memory stores, the token codec and the services together.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::SigningKeyMisconfigured` if the signing secret is
    /// missing or shorter than 32 bytes.
    pub fn from_config(cfg: &AuthConfig) -> Result<Self, AuthError> {
        let signing_key = SigningKey::from_config(&cfg.signing)?;
        let jwt = Arc::new(JwtService::new(signing_key));

        let accounts = Arc::new(InMemoryAccountDirectory::new());
        let passwords = Arc::new(Argon2PasswordVerifier::new());
        let refresh_tokens = RefreshTokenService::new(
            Arc::new(InMemoryRefreshTokenStorage::new()),
            cfg.tokens.refresh_token_lifetime,
        );
        let ledger = RevocationLedger::new(Arc::new(InMemoryRevokedTokenStorage::new()), jwt.clone());

        let sessions = Arc::new(SessionService::new(
            accounts.clone(),
            passwords.clone(),
            jwt.clone(),
            refresh_tokens.clone(),
            ledger.clone(),
            cfg.tokens.access_token_lifetime,
        ));
        let resets = Arc::new(PasswordResetService::new(
            accounts.clone(),
            passwords.clone(),
            Arc::new(InMemoryPasswordResetStorage::new()),
            refresh_tokens,
            Arc::new(LoggingResetNotifier),
            cfg.tokens.password_reset_lifetime,
        ));

        Ok(Self {
            accounts,
            passwords,
            sessions,
            resets,
            limiter: Arc::new(RateLimiter::from_config(&cfg.rate_limiting)),
            auth_state: AuthState::new(jwt, ledger),
        })
    }
}

pub fn build_app(cfg: &AppConfig, services: &AuthServices) -> Router {
    let body_limit = cfg.server.body_limit_bytes;

    let mut app = Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/me", get(handlers::me))
        .route("/api/admin/ping", get(handlers::admin_ping))
        .merge(auth_router(AuthHttpState::new(
            services.sessions.clone(),
            services.resets.clone(),
        )))
        // Authentication gate runs after admission control
        .layer(middleware::from_fn_with_state(
            services.auth_state.clone(),
            authentication_gate,
        ));

    if cfg.auth.rate_limiting.enabled {
        app = app.layer(middleware::from_fn_with_state(
            services.limiter.clone(),
            rate_limit,
        ));
    }

    app.layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri().path(),
                        http.status_code = Empty,
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>, latency: std::time::Duration, span: &tracing::Span| {
                        span.record("http.status_code", tracing::field::display(res.status().as_u16()));
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
}

pub struct StorefrontServer {
    addr: SocketAddr,
    app: Router,
    services: AuthServices,
    config: AppConfig,
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    pub fn build(self) -> Result<StorefrontServer, ServerError> {
        let services = AuthServices::from_config(&self.config.auth)?;
        bootstrap::seed_accounts(
            &services.accounts,
            services.passwords.as_ref(),
            &self.config.bootstrap,
        )?;
        let app = build_app(&self.config, &services);

        Ok(StorefrontServer {
            addr: self.addr,
            app,
            services,
            config: self.config,
        })
    }
}

impl StorefrontServer {
    /// Starts the revocation purge and the idle-bucket sweep.
    fn spawn_background_tasks(&self) -> Vec<JoinHandle<()>> {
        let auth = &self.config.auth;
        let mut tasks = vec![
            self.services
                .sessions
                .clone()
                .start_maintenance_task(auth.revocation.purge_interval),
        ];
        if auth.rate_limiting.enabled {
            tasks.push(
                self.services
                    .limiter
                    .clone()
                    .start_sweep_task(auth.rate_limiting.sweep_interval),
            );
        }
        tasks
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let tasks = self.spawn_background_tasks();

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(
            listener,
            self.app
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        for task in tasks {
            task.abort();
        }
        Ok(())
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
