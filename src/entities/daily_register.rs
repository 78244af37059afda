//! Daily register entity - One cash-drawer session, from opening to closing.
//!
//! A register is created with status `open` holding only the opening cash. Closing
//! overwrites every sales figure at once and flips the status to `closed`.
//! Monetary columns are in BRL; `*_orders` columns are order counts.

use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle of a register
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum RegisterStatus {
    /// Drawer opened, sales not yet recorded
    #[sea_orm(string_value = "open")]
    Open,
    /// Closing figures recorded
    #[sea_orm(string_value = "closed")]
    Closed,
}

/// Daily register database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "daily_registers")]
pub struct Model {
    /// Unique identifier for the register
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Business day this register belongs to
    pub date: NaiveDate,
    /// Owner of the register
    pub user_id: i64,
    /// Open until the closing is recorded
    pub status: RegisterStatus,

    /// Cash in the drawer at opening
    pub opening_cash: f64,
    /// Cash counted in the drawer at closing
    pub closing_cash: f64,

    // Delivery platforms
    /// iFood gross sales
    pub ifood_sales: f64,
    /// iFood order count
    pub ifood_orders: i32,
    /// iFood cancelled amount
    pub ifood_cancellations: f64,
    /// 99Food sales
    pub food99_sales: f64,
    /// 99Food order count
    pub food99_orders: i32,

    // Orders outside the marketplaces
    /// Orders taken at the counter
    pub counter_orders: i32,
    /// Orders taken over WhatsApp
    pub whatsapp_orders: i32,
    /// Orders placed through the Vuca app
    pub vuca_orders: i32,
    /// Delivery fees charged to customers
    pub delivery_fee: f64,

    // Card and PIX terminals
    /// Mercado Pago debit takings
    pub mp_debit: f64,
    /// Mercado Pago credit takings
    pub mp_credit: f64,
    /// Mercado Pago PIX takings
    pub mp_pix: f64,
    /// Itaú terminal 1 debit takings
    pub itau1_debit: f64,
    /// Itaú terminal 1 credit takings
    pub itau1_credit: f64,
    /// Itaú terminal 1 PIX takings
    pub itau1_pix: f64,
    /// Itaú terminal 2 debit takings
    pub itau2_debit: f64,
    /// Itaú terminal 2 credit takings
    pub itau2_credit: f64,
    /// Itaú terminal 2 PIX takings
    pub itau2_pix: f64,
    /// Itaú terminal 3 debit takings
    pub itau3_debit: f64,
    /// Itaú terminal 3 credit takings
    pub itau3_credit: f64,
    /// Itaú terminal 3 PIX takings
    pub itau3_pix: f64,
    /// Valori debit takings
    pub valori_debit: f64,
    /// Valori credit takings
    pub valori_credit: f64,
    /// Valori PIX takings
    pub valori_pix: f64,
    /// InfinitePay debit takings
    pub infinitepay_debit: f64,
    /// InfinitePay credit takings
    pub infinitepay_credit: f64,
    /// InfinitePay PIX takings
    pub infinitepay_pix: f64,
    /// C6 PIX takings
    pub c6_pix: f64,

    // Vuca point-of-sale breakdown
    /// Vuca delivery sales paid in cash
    pub vuca_delivery_cash: f64,
    /// Vuca delivery sales paid in debit
    pub vuca_delivery_debit: f64,
    /// Vuca delivery sales paid in credit
    pub vuca_delivery_credit: f64,
    /// Vuca delivery sales paid in PIX
    pub vuca_delivery_pix: f64,
    /// Vuca counter sales paid in cash
    pub vuca_counter_cash: f64,
    /// Vuca counter sales paid in debit
    pub vuca_counter_debit: f64,
    /// Vuca counter sales paid in credit
    pub vuca_counter_credit: f64,
    /// Vuca counter sales paid in PIX
    pub vuca_counter_pix: f64,
}

impl Model {
    /// A freshly opened register: every figure except the opening cash is zero.
    #[must_use]
    pub const fn opened(user_id: i64, date: NaiveDate, opening_cash: f64) -> Self {
        Self {
            id: 0,
            date,
            user_id,
            status: RegisterStatus::Open,
            opening_cash,
            closing_cash: 0.0,
            ifood_sales: 0.0,
            ifood_orders: 0,
            ifood_cancellations: 0.0,
            food99_sales: 0.0,
            food99_orders: 0,
            counter_orders: 0,
            whatsapp_orders: 0,
            vuca_orders: 0,
            delivery_fee: 0.0,
            mp_debit: 0.0,
            mp_credit: 0.0,
            mp_pix: 0.0,
            itau1_debit: 0.0,
            itau1_credit: 0.0,
            itau1_pix: 0.0,
            itau2_debit: 0.0,
            itau2_credit: 0.0,
            itau2_pix: 0.0,
            itau3_debit: 0.0,
            itau3_credit: 0.0,
            itau3_pix: 0.0,
            valori_debit: 0.0,
            valori_credit: 0.0,
            valori_pix: 0.0,
            infinitepay_debit: 0.0,
            infinitepay_credit: 0.0,
            infinitepay_pix: 0.0,
            c6_pix: 0.0,
            vuca_delivery_cash: 0.0,
            vuca_delivery_debit: 0.0,
            vuca_delivery_credit: 0.0,
            vuca_delivery_pix: 0.0,
            vuca_counter_cash: 0.0,
            vuca_counter_debit: 0.0,
            vuca_counter_credit: 0.0,
            vuca_counter_pix: 0.0,
        }
    }

    /// Whether the closing is still pending
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == RegisterStatus::Open
    }
}

/// Defines relationships between DailyRegister and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each register belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    /// One register has many withdrawals
    #[sea_orm(has_many = "super::withdrawal::Entity")]
    Withdrawals,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::withdrawal::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Withdrawals.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
