//! Token generation, validation, and management.
//!
//! This module provides:
//!
//! - Signing key validation
//! - Access token (JWT) encoding and decoding
//! - Refresh token creation and rotation
//! - Access token revocation

pub mod jwt;
pub mod refresh;
pub mod revocation;
pub mod signing;

pub use jwt::{AccessTokenClaims, JwtError, JwtService};
pub use refresh::{IssuedRefreshToken, RefreshTokenService};
pub use revocation::RevocationLedger;
pub use signing::{MIN_SECRET_LENGTH, SigningKey};
