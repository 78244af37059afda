//! Ledger entry entity - Expenses recorded by hand, outside the register flow.
//!
//! Entries are grouped by `category` (e.g. `"MERCADO"`, `"BEBIDAS"`) and by the
//! payment method used, then pivoted by day in the ledger and period reports.

use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of ledger entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(12))")]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// Goods bought for the business
    #[sea_orm(string_value = "purchase")]
    Purchase,
    /// Any other money going out (bills, loans, advances)
    #[sea_orm(string_value = "outflow")]
    Outflow,
}

impl EntryType {
    /// Parses the form value; anything but `outflow` is a purchase.
    #[must_use]
    pub fn parse_or_default(raw: &str) -> Self {
        if raw.trim() == "outflow" {
            Self::Outflow
        } else {
            Self::Purchase
        }
    }
}

/// Ledger entry database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    /// Unique identifier for the entry
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Day the expense happened
    pub date: NaiveDate,
    /// Purchase or other outflow
    pub entry_type: EntryType,
    /// Expense group, e.g. `"MERCADO"`
    pub category: String,
    /// Supplier or free-text description
    pub description: String,
    /// Amount spent
    pub amount: f64,
    /// How it was paid, e.g. `"PIX"`
    pub payment_method: String,
    /// User who recorded the entry
    pub user_id: i64,
}

/// Defines relationships between LedgerEntry and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each entry belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
