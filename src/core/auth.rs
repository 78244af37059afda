//! Password hashing and credential checks.
//!
//! Passwords are hashed with argon2 using a random salt per account; the PHC
//! string stored in `users.password_hash` carries the parameters and the salt.

use crate::{
    entities::{User, user},
    errors::{Error, Result},
};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::{Rng, distributions::Alphanumeric};
use sea_orm::prelude::*;
use tracing::{info, warn};

const TEMPORARY_PASSWORD_LEN: usize = 10;

/// Hashes a password into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::PasswordHash {
            message: e.to_string(),
        })
}

/// Checks a password against a stored hash. A malformed hash never matches.
#[must_use]
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(password_hash) else {
        warn!("Stored password hash could not be parsed");
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Random alphanumeric password handed out when an admin resets an account.
#[must_use]
pub fn generate_temporary_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TEMPORARY_PASSWORD_LEN)
        .map(char::from)
        .collect()
}

/// Looks up a user by name and verifies the password.
///
/// Unknown users and wrong passwords both yield [`Error::InvalidCredentials`].
pub async fn authenticate(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> Result<user::Model> {
    let account = User::find()
        .filter(user::Column::Username.eq(username.trim()))
        .one(db)
        .await?;

    match account {
        Some(account) if verify_password(password, &account.password_hash) => {
            info!(user_id = account.id, username = %account.username, "User logged in");
            Ok(account)
        }
        _ => {
            warn!(username = %username.trim(), "Failed login attempt");
            Err(Error::InvalidCredentials)
        }
    }
}
