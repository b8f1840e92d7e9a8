//! Authentication configuration.
//!
//! This module provides the configuration types for the credential and
//! session subsystem: signing key material, token lifetimes, the revocation
//! purge schedule and the admission controller's rate table.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound accepted for any token lifetime.
pub const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(366 * 24 * 60 * 60);

/// Root authentication configuration.
///
/// # Example (TOML)
///
/// ```toml
/// [auth.signing]
/// secret = "a-very-long-random-secret-of-at-least-32-bytes"
///
/// [auth.tokens]
/// access_token_lifetime = "15m"
/// refresh_token_lifetime = "7d"
///
/// [auth.rate_limiting]
/// default_requests_per_minute = 60
///
/// [[auth.rate_limiting.endpoints]]
/// prefix = "POST:/api/auth/login"
/// requests_per_minute = 5
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Token signing configuration.
    pub signing: SigningConfig,

    /// Token lifetimes.
    pub tokens: TokenConfig,

    /// Revocation ledger maintenance.
    pub revocation: RevocationConfig,

    /// Rate limiting configuration.
    pub rate_limiting: RateLimitingConfig,
}

/// Symmetric signing key configuration.
///
/// The secret is validated when the signing key is built, not here, so that
/// a missing secret surfaces as a startup failure of the key manager.
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SigningConfig {
    /// Raw HMAC secret. Must be at least 32 bytes.
    pub secret: String,
}

impl std::fmt::Debug for SigningConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningConfig")
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Token lifetime configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Access token lifetime.
    #[serde(with = "humantime_serde")]
    pub access_token_lifetime: Duration,

    /// Refresh token lifetime.
    #[serde(with = "humantime_serde")]
    pub refresh_token_lifetime: Duration,

    /// Password reset token lifetime.
    #[serde(with = "humantime_serde")]
    pub password_reset_lifetime: Duration,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            access_token_lifetime: Duration::from_secs(15 * 60),
            refresh_token_lifetime: Duration::from_secs(7 * 24 * 60 * 60),
            password_reset_lifetime: Duration::from_secs(30 * 60),
        }
    }
}

/// Revocation ledger maintenance configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RevocationConfig {
    /// How often expired revocation records (and expired refresh tokens)
    /// are purged.
    #[serde(with = "humantime_serde")]
    pub purge_interval: Duration,
}

impl Default for RevocationConfig {
    fn default() -> Self {
        Self {
            purge_interval: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// Admission controller configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitingConfig {
    /// Enable/disable the admission controller.
    pub enabled: bool,

    /// Bucket capacity for endpoints without a matching prefix.
    pub default_requests_per_minute: u32,

    /// Per-endpoint limits. The first entry whose prefix matches
    /// `METHOD:path` wins, so list more specific prefixes first.
    pub endpoints: Vec<EndpointLimit>,

    /// How often idle buckets are swept.
    #[serde(with = "humantime_serde")]
    pub sweep_interval: Duration,

    /// Number of idle refill windows (60s each) after which a bucket is
    /// evicted.
    pub idle_eviction_windows: u32,

    /// Bucket count that triggers an inline sweep.
    pub max_buckets: usize,
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_requests_per_minute: 60,
            endpoints: Vec::new(),
            sweep_interval: Duration::from_secs(5 * 60),
            idle_eviction_windows: 10,
            max_buckets: 100_000,
        }
    }
}

/// A per-endpoint rate limit entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EndpointLimit {
    /// Prefix matched against `METHOD:path`, e.g. `POST:/api/auth/login`.
    pub prefix: String,

    /// Bucket capacity (and refill per minute) for matching requests.
    pub requests_per_minute: u32,
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),
}

impl AuthConfig {
    /// Validates the configuration.
    ///
    /// The signing secret is checked separately by
    /// [`SigningKey::from_config`](crate::token::signing::SigningKey::from_config).
    ///
    /// # Errors
    ///
    /// Returns an error if any lifetime or rate value is zero, a lifetime
    /// exceeds [`MAX_TOKEN_LIFETIME`], or an endpoint prefix is malformed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, lifetime) in [
            ("access_token_lifetime", self.tokens.access_token_lifetime),
            ("refresh_token_lifetime", self.tokens.refresh_token_lifetime),
            ("password_reset_lifetime", self.tokens.password_reset_lifetime),
        ] {
            if lifetime > MAX_TOKEN_LIFETIME {
                return Err(ConfigError::InvalidValue(format!(
                    "{name} must not exceed {} days",
                    MAX_TOKEN_LIFETIME.as_secs() / 86_400
                )));
            }
        }
        if self.tokens.access_token_lifetime.is_zero() {
            return Err(ConfigError::InvalidValue(
                "access_token_lifetime must be > 0".to_string(),
            ));
        }
        if self.tokens.refresh_token_lifetime.is_zero() {
            return Err(ConfigError::InvalidValue(
                "refresh_token_lifetime must be > 0".to_string(),
            ));
        }
        if self.tokens.refresh_token_lifetime <= self.tokens.access_token_lifetime {
            return Err(ConfigError::InvalidValue(
                "refresh_token_lifetime must be longer than access_token_lifetime".to_string(),
            ));
        }
        if self.tokens.password_reset_lifetime.is_zero() {
            return Err(ConfigError::InvalidValue(
                "password_reset_lifetime must be > 0".to_string(),
            ));
        }
        if self.revocation.purge_interval.is_zero() {
            return Err(ConfigError::InvalidValue(
                "revocation purge_interval must be > 0".to_string(),
            ));
        }

        let rl = &self.rate_limiting;
        if rl.default_requests_per_minute == 0 {
            return Err(ConfigError::InvalidValue(
                "default_requests_per_minute must be > 0".to_string(),
            ));
        }
        if rl.sweep_interval.is_zero() {
            return Err(ConfigError::InvalidValue(
                "rate limiting sweep_interval must be > 0".to_string(),
            ));
        }
        if rl.idle_eviction_windows == 0 {
            return Err(ConfigError::InvalidValue(
                "idle_eviction_windows must be > 0".to_string(),
            ));
        }
        if rl.max_buckets == 0 {
            return Err(ConfigError::InvalidValue(
                "max_buckets must be > 0".to_string(),
            ));
        }
        for endpoint in &rl.endpoints {
            if endpoint.requests_per_minute == 0 {
                return Err(ConfigError::InvalidValue(format!(
                    "requests_per_minute for '{}' must be > 0",
                    endpoint.prefix
                )));
            }
            match endpoint.prefix.split_once(':') {
                Some((method, path)) if !method.is_empty() && path.starts_with('/') => {}
                _ => {
                    return Err(ConfigError::InvalidValue(format!(
                        "endpoint prefix '{}' must look like 'METHOD:/path'",
                        endpoint.prefix
                    )));
                }
            }
        }

        Ok(())
    }
}
