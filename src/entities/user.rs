//! User entity - Accounts that can log in and own registers and ledger entries.
//!
//! Passwords are stored as argon2 PHC strings, never in clear text.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Access level of an account
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access, including user management, ledger and reports
    #[sea_orm(string_value = "admin")]
    Admin,
    /// Regular operator
    #[sea_orm(string_value = "user")]
    User,
    /// Cashier; same permissions as a regular operator
    #[sea_orm(string_value = "caixa")]
    Caixa,
}

impl Role {
    /// Parses a role name from a form; anything unknown becomes [`Role::User`].
    #[must_use]
    pub fn parse_or_default(raw: &str) -> Self {
        match raw.trim() {
            "admin" => Self::Admin,
            "caixa" => Self::Caixa,
            _ => Self::User,
        }
    }

    /// Name used in forms and session tokens
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
            Self::Caixa => "caixa",
        }
    }
}

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Login name, unique across the system
    #[sea_orm(unique)]
    pub username: String,
    /// Argon2 hash of the password
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Access level
    pub role: Role,
}

impl Model {
    /// Whether this account has administrator rights
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user owns many daily registers
    #[sea_orm(has_many = "super::daily_register::Entity")]
    DailyRegisters,
    /// One user owns many ledger entries
    #[sea_orm(has_many = "super::ledger_entry::Entity")]
    LedgerEntries,
}

impl Related<super::daily_register::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DailyRegisters.def()
    }
}

impl Related<super::ledger_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LedgerEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
