//! Shared test utilities.
//!
//! This module provides common helper functions for setting up test databases
//! and creating users, registers and ledger entries with sensible defaults.

#![allow(clippy::panic)]

use crate::{
    core::{
        auth,
        register::{self, ClosingInput},
    },
    entities::{EntryType, Role, daily_register, ledger_entry, user},
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use std::sync::OnceLock;

/// Password of every user created by [`create_test_user`].
pub const TEST_PASSWORD: &str = "senha-de-teste";

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Shorthand for a calendar date; panics on invalid input.
#[must_use]
pub fn test_date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_else(|| panic!("invalid test date {year}-{month}-{day}"))
}

fn test_password_hash() -> &'static str {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| {
        auth::hash_password(TEST_PASSWORD).unwrap_or_else(|e| panic!("hashing test password: {e}"))
    })
}

/// Creates a user whose password is [`TEST_PASSWORD`].
pub async fn create_test_user(
    db: &DatabaseConnection,
    username: &str,
    role: Role,
) -> Result<user::Model> {
    let user = user::ActiveModel {
        username: Set(username.to_string()),
        password_hash: Set(test_password_hash().to_string()),
        role: Set(role),
        ..Default::default()
    };
    Ok(user.insert(db).await?)
}

/// Opens a register for the user with no opening cash.
pub async fn create_test_register(
    db: &DatabaseConnection,
    user_id: i64,
    date: NaiveDate,
) -> Result<daily_register::Model> {
    register::open_register(db, user_id, date, 0.0).await
}

/// Opens and immediately closes a register with the given figures.
pub async fn create_closed_register(
    db: &DatabaseConnection,
    user_id: i64,
    date: NaiveDate,
    closing: &ClosingInput,
) -> Result<daily_register::Model> {
    let opened = create_test_register(db, user_id, date).await?;
    register::close_register(db, user_id, opened.id, closing).await
}

/// Open register with every figure at zero, not persisted.
#[must_use]
pub fn sample_register() -> daily_register::Model {
    daily_register::Model {
        id: 1,
        ..daily_register::Model::opened(1, test_date(2024, 3, 8), 0.0)
    }
}

/// User model that is not persisted.
#[must_use]
pub fn sample_user(id: i64, role: Role) -> user::Model {
    user::Model {
        id,
        username: format!("user{id}"),
        password_hash: String::new(),
        role,
    }
}

/// Ledger entry that is not persisted.
#[must_use]
pub fn sample_entry(
    date: NaiveDate,
    category: &str,
    description: &str,
    amount: f64,
    payment_method: &str,
) -> ledger_entry::Model {
    ledger_entry::Model {
        id: 0,
        date,
        entry_type: EntryType::Purchase,
        category: category.to_string(),
        description: description.to_string(),
        amount,
        payment_method: payment_method.to_string(),
        user_id: 1,
    }
}
