//! Daily register business logic - Opening, closing, history and removal.
//!
//! A user opens a register once per session with the cash counted in the drawer.
//! Closing records every sales figure at once and rewrites the session's
//! withdrawals. Each multi-step write runs inside one database transaction, so a
//! failure leaves the register exactly as it was.

use crate::{
    core::{money, period::DateRange},
    entities::{
        DailyRegister, RegisterStatus, Withdrawal, daily_register, user, withdrawal,
    },
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{
    ActiveValue::NotSet, IntoActiveModel, QueryOrder, Set, TransactionTrait, prelude::*,
};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::info;

/// Form field holding the opening amount typed by hand, used when no
/// denomination was counted.
pub const OPENING_AMOUNT_FIELD: &str = "opening_amount";

/// Which closed registers a history listing shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryScope {
    /// Every user's registers
    All,
    /// Registers of a single user
    User(i64),
}

/// One withdrawal as submitted with the closing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct WithdrawalInput {
    /// What the money was used for
    pub description: String,
    /// Amount taken out
    pub amount: f64,
    /// Payment method label, cash is `Dinheiro`
    pub payment_method: String,
}

/// Every figure recorded when closing a register.
///
/// Missing fields count as zero.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClosingInput {
    /// Cash counted in the drawer at closing
    pub closing_cash: f64,

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

    /// Orders taken at the counter
    pub counter_orders: i32,
    /// Orders taken over WhatsApp
    pub whatsapp_orders: i32,
    /// Orders placed through the Vuca app
    pub vuca_orders: i32,
    /// Delivery fees charged to customers
    pub delivery_fee: f64,

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

    /// Withdrawals replacing the ones already recorded
    pub withdrawals: Vec<WithdrawalInput>,
}

impl ClosingInput {
    fn amounts(&self) -> [f64; 32] {
        [
            self.closing_cash,
            self.ifood_sales,
            self.ifood_cancellations,
            self.food99_sales,
            self.delivery_fee,
            self.mp_debit,
            self.mp_credit,
            self.mp_pix,
            self.itau1_debit,
            self.itau1_credit,
            self.itau1_pix,
            self.itau2_debit,
            self.itau2_credit,
            self.itau2_pix,
            self.itau3_debit,
            self.itau3_credit,
            self.itau3_pix,
            self.valori_debit,
            self.valori_credit,
            self.valori_pix,
            self.infinitepay_debit,
            self.infinitepay_credit,
            self.infinitepay_pix,
            self.c6_pix,
            self.vuca_delivery_cash,
            self.vuca_delivery_debit,
            self.vuca_delivery_credit,
            self.vuca_delivery_pix,
            self.vuca_counter_cash,
            self.vuca_counter_debit,
            self.vuca_counter_credit,
            self.vuca_counter_pix,
        ]
    }

    const fn order_counts(&self) -> [i32; 5] {
        [
            self.ifood_orders,
            self.food99_orders,
            self.counter_orders,
            self.whatsapp_orders,
            self.vuca_orders,
        ]
    }

    /// Rejects negative or non-finite figures.
    pub fn validate(&self) -> Result<()> {
        let valid_amount = |value: f64| value.is_finite() && value >= 0.0;

        if !self.amounts().into_iter().all(valid_amount) {
            return Err(Error::validation(
                "Os valores do fechamento devem ser números positivos.",
            ));
        }
        if self.order_counts().into_iter().any(|count| count < 0) {
            return Err(Error::validation(
                "A quantidade de pedidos não pode ser negativa.",
            ));
        }
        if !self.withdrawals.iter().all(|w| valid_amount(w.amount)) {
            return Err(Error::validation(
                "O valor de cada sangria deve ser um número positivo.",
            ));
        }
        Ok(())
    }

    /// The register as it looks after closing with these figures.
    #[must_use]
    pub fn apply(&self, register: daily_register::Model) -> daily_register::Model {
        daily_register::Model {
            status: RegisterStatus::Closed,
            closing_cash: self.closing_cash,
            ifood_sales: self.ifood_sales,
            ifood_orders: self.ifood_orders,
            ifood_cancellations: self.ifood_cancellations,
            food99_sales: self.food99_sales,
            food99_orders: self.food99_orders,
            counter_orders: self.counter_orders,
            whatsapp_orders: self.whatsapp_orders,
            vuca_orders: self.vuca_orders,
            delivery_fee: self.delivery_fee,
            mp_debit: self.mp_debit,
            mp_credit: self.mp_credit,
            mp_pix: self.mp_pix,
            itau1_debit: self.itau1_debit,
            itau1_credit: self.itau1_credit,
            itau1_pix: self.itau1_pix,
            itau2_debit: self.itau2_debit,
            itau2_credit: self.itau2_credit,
            itau2_pix: self.itau2_pix,
            itau3_debit: self.itau3_debit,
            itau3_credit: self.itau3_credit,
            itau3_pix: self.itau3_pix,
            valori_debit: self.valori_debit,
            valori_credit: self.valori_credit,
            valori_pix: self.valori_pix,
            infinitepay_debit: self.infinitepay_debit,
            infinitepay_credit: self.infinitepay_credit,
            infinitepay_pix: self.infinitepay_pix,
            c6_pix: self.c6_pix,
            vuca_delivery_cash: self.vuca_delivery_cash,
            vuca_delivery_debit: self.vuca_delivery_debit,
            vuca_delivery_credit: self.vuca_delivery_credit,
            vuca_delivery_pix: self.vuca_delivery_pix,
            vuca_counter_cash: self.vuca_counter_cash,
            vuca_counter_debit: self.vuca_counter_debit,
            vuca_counter_credit: self.vuca_counter_credit,
            vuca_counter_pix: self.vuca_counter_pix,
            ..register
        }
    }
}

/// Form field name for a denomination: `0.05` -> `v_0_05`, `100` -> `v_100`.
#[must_use]
pub fn denomination_field(denomination: f64) -> String {
    format!("v_{}", denomination.to_string().replace('.', "_"))
}

/// Opening cash from the denomination form.
///
/// Sums the per-denomination totals; when nothing was counted, falls back to the
/// amount typed into [`OPENING_AMOUNT_FIELD`].
#[must_use]
pub fn opening_cash_from_form<S: std::hash::BuildHasher>(
    form: &HashMap<String, String, S>,
    denominations: &[f64],
) -> f64 {
    let field = |name: &str| form.get(name).map_or(0.0, |raw| money::parse_brl(raw));

    let counted: f64 = denominations
        .iter()
        .map(|d| field(&denomination_field(*d)))
        .sum();

    if counted > 0.0 {
        money::round2(counted)
    } else {
        field(OPENING_AMOUNT_FIELD)
    }
}

/// The user's open register, if any.
pub async fn get_open_register<C>(db: &C, user_id: i64) -> Result<Option<daily_register::Model>>
where
    C: ConnectionTrait,
{
    DailyRegister::find()
        .filter(daily_register::Column::UserId.eq(user_id))
        .filter(daily_register::Column::Status.eq(RegisterStatus::Open))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a register by id.
pub async fn get_register(
    db: &DatabaseConnection,
    register_id: i64,
) -> Result<Option<daily_register::Model>> {
    DailyRegister::find_by_id(register_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a register by id, failing with [`Error::NotFound`].
pub async fn require_register(
    db: &DatabaseConnection,
    register_id: i64,
) -> Result<daily_register::Model> {
    get_register(db, register_id)
        .await?
        .ok_or(Error::NotFound {
            entity: "Register",
            id: register_id,
        })
}

/// Whether `viewer` may look at `register`: owners and administrators can.
#[must_use]
pub fn can_view(register: &daily_register::Model, viewer: &user::Model) -> bool {
    viewer.is_admin() || register.user_id == viewer.id
}

/// Opens a new register for the user.
///
/// Fails with [`Error::RegisterAlreadyOpen`] when the user still has an open one;
/// the check and the insert share a transaction.
pub async fn open_register(
    db: &DatabaseConnection,
    user_id: i64,
    date: NaiveDate,
    opening_cash: f64,
) -> Result<daily_register::Model> {
    if !opening_cash.is_finite() || opening_cash < 0.0 {
        return Err(Error::validation("Valor inicial do caixa inválido."));
    }

    let txn = db.begin().await?;

    if let Some(open) = get_open_register(&txn, user_id).await? {
        return Err(Error::RegisterAlreadyOpen {
            register_id: open.id,
        });
    }

    let mut register = daily_register::Model::opened(user_id, date, opening_cash)
        .into_active_model()
        .reset_all();
    register.id = NotSet;
    let register = register.insert(&txn).await?;

    txn.commit().await?;
    info!(
        register_id = register.id,
        user_id,
        %date,
        opening_cash,
        "Register opened"
    );
    Ok(register)
}

/// Closes (or re-closes) a register with the given figures.
///
/// Only the owner may close. The register becomes `closed`, every figure is
/// overwritten and the withdrawals are replaced, all in one transaction.
pub async fn close_register(
    db: &DatabaseConnection,
    actor_id: i64,
    register_id: i64,
    input: &ClosingInput,
) -> Result<daily_register::Model> {
    input.validate()?;

    let txn = db.begin().await?;

    let register = DailyRegister::find_by_id(register_id)
        .one(&txn)
        .await?
        .ok_or(Error::NotFound {
            entity: "Register",
            id: register_id,
        })?;

    if register.user_id != actor_id {
        return Err(Error::forbidden("Acesso não autorizado."));
    }

    let was_open = register.is_open();
    let closed = input
        .apply(register)
        .into_active_model()
        .reset_all()
        .update(&txn)
        .await?;

    Withdrawal::delete_many()
        .filter(withdrawal::Column::RegisterId.eq(register_id))
        .exec(&txn)
        .await?;

    let withdrawals: Vec<withdrawal::ActiveModel> = input
        .withdrawals
        .iter()
        .map(|w| withdrawal::ActiveModel {
            description: Set(w.description.trim().to_string()),
            amount: Set(w.amount),
            payment_method: Set(w.payment_method.trim().to_string()),
            register_id: Set(register_id),
            ..Default::default()
        })
        .collect();
    if !withdrawals.is_empty() {
        Withdrawal::insert_many(withdrawals).exec(&txn).await?;
    }

    txn.commit().await?;
    info!(
        register_id,
        actor_id,
        withdrawals = input.withdrawals.len(),
        edited = !was_open,
        "Register closed"
    );
    Ok(closed)
}

/// Withdrawals taken from a register, in the order they were recorded.
pub async fn withdrawals_for(
    db: &DatabaseConnection,
    register_id: i64,
) -> Result<Vec<withdrawal::Model>> {
    Withdrawal::find()
        .filter(withdrawal::Column::RegisterId.eq(register_id))
        .order_by_asc(withdrawal::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Closed registers, most recent day first.
pub async fn list_history(
    db: &DatabaseConnection,
    scope: HistoryScope,
) -> Result<Vec<daily_register::Model>> {
    let mut query = DailyRegister::find()
        .filter(daily_register::Column::Status.eq(RegisterStatus::Closed));
    if let HistoryScope::User(user_id) = scope {
        query = query.filter(daily_register::Column::UserId.eq(user_id));
    }
    query
        .order_by_desc(daily_register::Column::Date)
        .order_by_desc(daily_register::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// The user's closed register for a given day, used as comparison base.
pub async fn find_closed_on(
    db: &DatabaseConnection,
    user_id: i64,
    date: NaiveDate,
) -> Result<Option<daily_register::Model>> {
    DailyRegister::find()
        .filter(daily_register::Column::UserId.eq(user_id))
        .filter(daily_register::Column::Status.eq(RegisterStatus::Closed))
        .filter(daily_register::Column::Date.eq(date))
        .order_by_desc(daily_register::Column::Id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Closed registers of every user within the range.
pub async fn closed_registers_between(
    db: &DatabaseConnection,
    range: DateRange,
) -> Result<Vec<daily_register::Model>> {
    DailyRegister::find()
        .filter(daily_register::Column::Status.eq(RegisterStatus::Closed))
        .filter(daily_register::Column::Date.between(range.start, range.end))
        .order_by_asc(daily_register::Column::Date)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Deletes a closed register together with its withdrawals.
pub async fn delete_register(db: &DatabaseConnection, register_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let register = DailyRegister::find_by_id(register_id)
        .one(&txn)
        .await?
        .ok_or(Error::NotFound {
            entity: "Register",
            id: register_id,
        })?;

    if register.is_open() {
        return Err(Error::validation(
            "Só é possível excluir registros já fechados.",
        ));
    }

    Withdrawal::delete_many()
        .filter(withdrawal::Column::RegisterId.eq(register_id))
        .exec(&txn)
        .await?;
    register.delete(&txn).await?;

    txn.commit().await?;
    info!(register_id, "Register deleted");
    Ok(())
}
