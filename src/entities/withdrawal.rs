//! Withdrawal entity - Money taken out of the drawer during a register session.
//!
//! Withdrawals are always rewritten in bulk when a register is closed or edited.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Withdrawal database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "withdrawals")]
pub struct Model {
    /// Unique identifier for the withdrawal
    #[sea_orm(primary_key)]
    pub id: i64,
    /// What the money was used for
    pub description: String,
    /// Amount taken out
    pub amount: f64,
    /// Payment method label, e.g. `"Dinheiro"` or `"PIX"`
    pub payment_method: String,
    /// Register this withdrawal was taken from
    pub register_id: i64,
}

/// Defines relationships between Withdrawal and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each withdrawal belongs to one register
    #[sea_orm(
        belongs_to = "super::daily_register::Entity",
        from = "Column::RegisterId",
        to = "super::daily_register::Column::Id"
    )]
    DailyRegister,
}

impl Related<super::daily_register::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DailyRegister.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
