//! Bootstrap administrator configuration from environment variables.
//!
//! On every start the application makes sure an administrator account exists, so a
//! fresh database can be logged into. The credentials come from `ADMIN_USERNAME`
//! and `ADMIN_PASSWORD` in the `.env` file.

use tracing::warn;

const DEFAULT_ADMIN_USERNAME: &str = "admin";
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Credentials for the account created when the database has no such user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminBootstrap {
    /// `ADMIN_USERNAME`, `admin` when unset
    pub username: String,
    /// `ADMIN_PASSWORD`
    pub password: String,
}

/// Reads the bootstrap administrator from the environment.
///
/// Falls back to `admin` / `admin123` and logs a warning when no password is set.
#[must_use]
pub fn get_admin_bootstrap() -> AdminBootstrap {
    let username = std::env::var("ADMIN_USERNAME")
        .ok()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_ADMIN_USERNAME.to_string());

    let password = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| {
        warn!("ADMIN_PASSWORD not set; using the default password, change it after first login");
        DEFAULT_ADMIN_PASSWORD.to_string()
    });

    AdminBootstrap { username, password }
}
