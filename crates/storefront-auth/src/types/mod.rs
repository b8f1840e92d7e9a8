//! Common types used across the authentication modules.
//!
//! ## Domain Types
//!
//! - [`Account`] - Identity record resolved at login
//! - [`Role`] - Role claim carried by access tokens
//! - [`RefreshToken`] - Single-use refresh token record
//! - [`RevokedTokenRecord`] - Revocation ledger entry
//! - [`PasswordResetToken`] - Single-use password reset record

pub mod account;
pub mod password_reset;
pub mod refresh_token;
pub mod revoked_token;
pub mod secret;

pub use account::{Account, Role};
pub use password_reset::PasswordResetToken;
pub use refresh_token::RefreshToken;
pub use revoked_token::RevokedTokenRecord;
pub use secret::{generate_token, hash_token};
