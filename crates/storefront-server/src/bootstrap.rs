//! Bootstrap module for seeding the account directory.
//!
//! Seed accounts come from the `[bootstrap]` configuration section. Their
//! passwords are hashed at startup; plain text never reaches the directory.

use storefront_auth::AuthResult;
use storefront_auth::password::PasswordVerifier;
use storefront_auth::storage::InMemoryAccountDirectory;
use tracing::{info, warn};

use crate::config::BootstrapConfig;

/// Statistics from a bootstrap run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BootstrapStats {
    pub created: usize,
    pub skipped: usize,
}

/// Registers every configured seed account.
///
/// Accounts whose email is already registered are skipped, so running the
/// bootstrap twice is harmless.
///
/// # Errors
///
/// Returns an error if hashing a password fails.
pub fn seed_accounts(
    directory: &InMemoryAccountDirectory,
    passwords: &dyn PasswordVerifier,
    config: &BootstrapConfig,
) -> AuthResult<BootstrapStats> {
    let mut stats = BootstrapStats::default();

    for seed in &config.accounts {
        let hash = passwords.hash(&seed.password)?;
        match directory.register(seed.email.trim(), hash, seed.role) {
            Ok(account) => {
                info!(account_id = account.id, role = %account.role, "Seed account created");
                stats.created += 1;
            }
            Err(e) => {
                warn!(email = %seed.email, error = %e, "Seed account skipped");
                stats.skipped += 1;
            }
        }
    }

    if !config.accounts.is_empty() {
        info!(
            created = stats.created,
            skipped = stats.skipped,
            "Account bootstrap completed"
        );
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use storefront_auth::password::Argon2PasswordVerifier;
    use storefront_auth::storage::AccountDirectory;
    use storefront_auth::types::Role;

    use super::*;
    use crate::config::SeedAccountConfig;

    fn seed(email: &str, role: Role) -> SeedAccountConfig {
        SeedAccountConfig {
            email: email.into(),
            password: "seed-password".into(),
            role,
        }
    }

    #[tokio::test]
    async fn test_seed_accounts_hashes_passwords() {
        let directory = InMemoryAccountDirectory::new();
        let passwords = Argon2PasswordVerifier::new();
        let config = BootstrapConfig {
            accounts: vec![seed("admin@example.com", Role::Admin)],
        };

        let stats = seed_accounts(&directory, &passwords, &config).unwrap();
        assert_eq!(stats.created, 1);

        let account = directory
            .find_by_email("admin@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(account.role, Role::Admin);
        assert_ne!(account.password_hash, "seed-password");
        assert!(passwords.matches("seed-password", &account.password_hash));
    }

    #[test]
    fn test_duplicate_seed_is_skipped() {
        let directory = InMemoryAccountDirectory::new();
        let passwords = Argon2PasswordVerifier::new();
        let config = BootstrapConfig {
            accounts: vec![
                seed("ana@example.com", Role::User),
                seed("ANA@example.com", Role::Admin),
            ],
        };

        let stats = seed_accounts(&directory, &passwords, &config).unwrap();
        assert_eq!(stats, BootstrapStats { created: 1, skipped: 1 });
        assert_eq!(directory.len(), 1);
    }
}
