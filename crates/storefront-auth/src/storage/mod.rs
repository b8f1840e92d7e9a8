//! Storage traits for authentication data.
//!
//! This module defines storage interfaces for:
//!
//! - Account lookups (owned by the customer domain)
//! - Refresh tokens
//! - Revoked access tokens
//! - Password reset tokens
//!
//! # Implementations
//!
//! [`memory`] provides single-node `DashMap` backends for all of them.

pub mod account;
pub mod memory;
pub mod password_reset;
pub mod refresh_token;
pub mod revoked_token;

pub use account::AccountDirectory;
pub use memory::{
    InMemoryAccountDirectory, InMemoryPasswordResetStorage, InMemoryRefreshTokenStorage,
    InMemoryRevokedTokenStorage,
};
pub use password_reset::PasswordResetStorage;
pub use refresh_token::RefreshTokenStorage;
pub use revoked_token::RevokedTokenStorage;
