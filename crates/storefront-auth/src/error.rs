//! Authentication and session error types.
//!
//! This module defines all error types that can occur while issuing,
//! validating, rotating or revoking credentials.

use std::fmt;

/// Errors that can occur during credential and session operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The email/password pair did not match a known account.
    ///
    /// The message is identical for unknown accounts and wrong passwords.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The access token's expiry has passed.
    #[error("Token expired")]
    ExpiredToken,

    /// The access token's signature or structure could not be verified.
    #[error("Invalid token signature")]
    InvalidSignature,

    /// The access token was explicitly revoked (logout).
    #[error("Token revoked")]
    RevokedToken,

    /// The refresh token is not present in the store.
    #[error("Refresh token not found")]
    RefreshTokenNotFound,

    /// The refresh token was found but is past its expiry.
    #[error("Refresh token expired")]
    RefreshTokenExpired,

    /// The refresh token cannot be used, as reported to callers.
    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    /// The password reset token is unknown or expired.
    #[error("Invalid or expired password reset token")]
    InvalidPasswordResetToken,

    /// The client exceeded its admission budget.
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// The signing secret is missing or too weak. Fatal at startup.
    #[error("Signing key misconfigured: {message}")]
    SigningKeyMisconfigured {
        /// Description of what is wrong with the key material.
        message: String,
    },

    /// The request lacks valid authentication credentials.
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Description of why the request is unauthorized.
        message: String,
    },

    /// The authenticated account lacks permission for the action.
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Description of why access is forbidden.
        message: String,
    },

    /// The request is invalid or malformed.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of why the request is invalid.
        message: String,
    },

    /// An error occurred while storing or retrieving auth data.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `SigningKeyMisconfigured` error.
    #[must_use]
    pub fn signing_key(message: impl Into<String>) -> Self {
        Self::SigningKeyMisconfigured {
            message: message.into(),
        }
    }

    /// Creates a new `Unauthorized` error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Creates a new `Forbidden` error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a client error (4xx category).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials
                | Self::ExpiredToken
                | Self::InvalidSignature
                | Self::RevokedToken
                | Self::RefreshTokenNotFound
                | Self::RefreshTokenExpired
                | Self::InvalidRefreshToken
                | Self::InvalidPasswordResetToken
                | Self::RateLimitExceeded
                | Self::Unauthorized { .. }
                | Self::Forbidden { .. }
                | Self::InvalidRequest { .. }
        )
    }

    /// Returns `true` if this is a server error (5xx category).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::SigningKeyMisconfigured { .. } | Self::Storage { .. } | Self::Internal { .. }
        )
    }

    /// Returns `true` if this is an access token error.
    #[must_use]
    pub fn is_token_error(&self) -> bool {
        matches!(
            self,
            Self::ExpiredToken | Self::InvalidSignature | Self::RevokedToken
        )
    }

    /// Returns `true` if this is a refresh token error.
    #[must_use]
    pub fn is_refresh_error(&self) -> bool {
        matches!(
            self,
            Self::RefreshTokenNotFound | Self::RefreshTokenExpired | Self::InvalidRefreshToken
        )
    }

    /// Collapses the internal refresh failures into the single error
    /// callers are allowed to observe.
    #[must_use]
    pub fn into_public_refresh_error(self) -> Self {
        if self.is_refresh_error() {
            Self::InvalidRefreshToken
        } else {
            self
        }
    }

    /// Returns the error category for logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidCredentials => ErrorCategory::Authentication,
            Self::ExpiredToken => ErrorCategory::Token,
            Self::InvalidSignature => ErrorCategory::Token,
            Self::RevokedToken => ErrorCategory::Token,
            Self::RefreshTokenNotFound => ErrorCategory::Token,
            Self::RefreshTokenExpired => ErrorCategory::Token,
            Self::InvalidRefreshToken => ErrorCategory::Token,
            Self::InvalidPasswordResetToken => ErrorCategory::Validation,
            Self::RateLimitExceeded => ErrorCategory::Admission,
            Self::SigningKeyMisconfigured { .. } => ErrorCategory::Configuration,
            Self::Unauthorized { .. } => ErrorCategory::Authentication,
            Self::Forbidden { .. } => ErrorCategory::Authorization,
            Self::InvalidRequest { .. } => ErrorCategory::Validation,
            Self::Storage { .. } => ErrorCategory::Infrastructure,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the machine-readable error code used in response bodies.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "invalid_credentials",
            Self::ExpiredToken => "token_expired",
            Self::InvalidSignature => "invalid_token",
            Self::RevokedToken => "token_revoked",
            Self::RefreshTokenNotFound
            | Self::RefreshTokenExpired
            | Self::InvalidRefreshToken => "invalid_refresh_token",
            Self::InvalidPasswordResetToken => "invalid_reset_token",
            Self::RateLimitExceeded => "rate_limit_exceeded",
            Self::Unauthorized { .. } => "unauthorized",
            Self::Forbidden { .. } => "forbidden",
            Self::InvalidRequest { .. } => "invalid_request",
            Self::SigningKeyMisconfigured { .. } | Self::Storage { .. } | Self::Internal { .. } => {
                "server_error"
            }
        }
    }
}

/// Categories of authentication errors for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Identity verification failures.
    Authentication,
    /// Permission checks.
    Authorization,
    /// Access or refresh token failures.
    Token,
    /// Request validation errors.
    Validation,
    /// Rate limiting rejections.
    Admission,
    /// Infrastructure/storage errors.
    Infrastructure,
    /// Configuration errors.
    Configuration,
    /// Internal server errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authentication => write!(f, "authentication"),
            Self::Authorization => write!(f, "authorization"),
            Self::Token => write!(f, "token"),
            Self::Validation => write!(f, "validation"),
            Self::Admission => write!(f, "admission"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Configuration => write!(f, "configuration"),
            Self::Internal => write!(f, "internal"),
        }
    }
}
