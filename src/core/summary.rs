//! Daily summary of a closed register.
//!
//! Everything here except [`build_daily_summary`] is a pure function over an
//! already-fetched register and its withdrawals. Cash figures follow the shop's
//! conference routine: the cash expected in the drawer comes from the Vuca cash
//! sales minus cash withdrawals, and the discrepancy is what the count differs
//! from that.

use crate::{
    config::AppConfig,
    core::{
        money::round2,
        period,
        register,
        terminal::{self, CardMethod, Terminal},
    },
    entities::{daily_register, withdrawal},
    errors::Result,
};
use chrono::Days;
use sea_orm::DatabaseConnection;
use serde::Serialize;

const CASH_METHOD: &str = "dinheiro";

/// Headline figures of a day.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Totals {
    /// Orders across every channel
    pub total_orders: i64,
    /// Terminals, iFood net, 99Food and cash sales
    pub total_sales: f64,
    /// Total sales per order, zero without orders
    pub average_ticket: f64,
    /// Sum of every card and PIX terminal
    pub terminal_total: f64,
    /// iFood sales after cancellations and platform fees
    pub ifood_net: f64,
    /// Cash sales reported by Vuca
    pub vuca_cash_sales: f64,
    /// Withdrawals paid in cash
    pub cash_withdrawals: f64,
    /// Cash the drawer should have gained
    pub expected_cash: f64,
    /// Closing cash minus opening cash
    pub cash_intake: f64,
    /// Cash intake minus expected cash
    pub cash_discrepancy: f64,
    /// Cash intake plus cash withdrawals
    pub cash_sales: f64,
}

/// Comparison with the same weekday of the previous week.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekOverWeek {
    /// Day used as base, when a closed register exists for it
    pub base_date: Option<String>,
    /// Total sales of the base day
    pub base_sales: Option<f64>,
    /// Change from the base day, zero without one
    pub percent: f64,
}

/// Debit/credit/PIX of one terminal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TerminalLine {
    /// Terminal label
    pub name: &'static str,
    /// Debit takings
    pub debit: f64,
    /// Credit takings
    pub credit: f64,
    /// PIX takings
    pub pix: f64,
    /// Sum of the three, rounded to cents
    pub total: f64,
}

/// Sum per payment method across terminals.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MethodTotals {
    /// Debit across terminals
    pub debit: f64,
    /// Credit across terminals
    pub credit: f64,
    /// PIX across terminals
    pub pix: f64,
}

/// Figures of one delivery platform
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformInfo {
    /// Order count
    pub orders: i32,
    /// Gross sales after cancellations
    pub value: f64,
    /// What reaches the shop after platform fees
    pub net: f64,
    /// Cancelled amount
    pub cancelled: f64,
}

/// Orders taken outside the delivery platforms
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderBreakdown {
    /// At the counter
    pub counter: i32,
    /// Over WhatsApp
    pub whatsapp: i32,
    /// Through the Vuca app
    pub vuca: i32,
    /// Delivery fees charged
    pub delivery_fee: f64,
}

/// A withdrawal as listed on the summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WithdrawalLine {
    /// What the money was used for
    pub description: String,
    /// Amount taken out
    pub amount: f64,
    /// Payment method label
    pub payment_method: String,
}

/// Everything the summary page shows for one register.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    /// The register itself
    pub register: daily_register::Model,
    /// Date as `DD/MM/YYYY`
    pub date_br: String,
    /// Portuguese weekday name
    pub weekday: &'static str,
    /// Headline figures
    pub totals: Totals,
    /// Comparison with the previous week
    pub week_over_week: WeekOverWeek,
    /// One line per terminal
    pub terminals: Vec<TerminalLine>,
    /// Sum per method
    pub method_totals: MethodTotals,
    /// iFood figures
    pub ifood: PlatformInfo,
    /// 99Food figures
    pub food99: PlatformInfo,
    /// Other order channels
    pub orders: OrderBreakdown,
    /// Withdrawals of the session
    pub withdrawals: Vec<WithdrawalLine>,
    /// Sum of every withdrawal
    pub withdrawals_total: f64,
}

/// Cash withdrawals only; the method label is compared case-insensitively.
#[must_use]
pub fn cash_withdrawals(withdrawals: &[withdrawal::Model]) -> f64 {
    withdrawals
        .iter()
        .filter(|w| w.payment_method.trim().to_lowercase() == CASH_METHOD)
        .map(|w| w.amount)
        .sum()
}

/// iFood sales minus cancellations, scaled by the net factor.
#[must_use]
pub fn ifood_net(register: &daily_register::Model, net_factor: f64) -> f64 {
    (register.ifood_sales - register.ifood_cancellations) * net_factor
}

/// Orders across every channel.
#[must_use]
pub fn total_orders(register: &daily_register::Model) -> i64 {
    [
        register.ifood_orders,
        register.food99_orders,
        register.counter_orders,
        register.whatsapp_orders,
        register.vuca_orders,
    ]
    .into_iter()
    .map(i64::from)
    .sum()
}

/// Headline totals of a register.
#[must_use]
pub fn compute_totals(
    register: &daily_register::Model,
    withdrawals: &[withdrawal::Model],
    net_factor: f64,
) -> Totals {
    let terminal_total = terminal::terminals_total(register);
    let ifood_net = ifood_net(register, net_factor);

    let vuca_cash_sales = register.vuca_counter_cash + register.vuca_delivery_cash;
    let cash_withdrawals = cash_withdrawals(withdrawals);
    let expected_cash = vuca_cash_sales - cash_withdrawals;
    let cash_intake = register.closing_cash - register.opening_cash;
    let cash_discrepancy = cash_intake - expected_cash;
    let cash_sales = cash_intake + cash_withdrawals;

    let total_sales = terminal_total + ifood_net + register.food99_sales + cash_sales;
    let total_orders = total_orders(register);
    #[allow(clippy::cast_precision_loss)]
    let average_ticket = if total_orders > 0 {
        total_sales / total_orders as f64
    } else {
        0.0
    };

    Totals {
        total_orders,
        total_sales,
        average_ticket,
        terminal_total,
        ifood_net,
        vuca_cash_sales,
        cash_withdrawals,
        expected_cash,
        cash_intake,
        cash_discrepancy,
        cash_sales,
    }
}

/// Percentage change from `base` to `current`; zero without a usable base.
#[must_use]
pub fn week_over_week_percent(current: f64, base: Option<f64>) -> f64 {
    match base {
        Some(base) if base != 0.0 => (current - base) / base * 100.0,
        _ => 0.0,
    }
}

/// One line per terminal with its method split.
#[must_use]
pub fn terminal_lines(register: &daily_register::Model) -> Vec<TerminalLine> {
    Terminal::ALL
        .iter()
        .map(|t| {
            let debit = t.amount(register, CardMethod::Debit).unwrap_or(0.0);
            let credit = t.amount(register, CardMethod::Credit).unwrap_or(0.0);
            let pix = t.amount(register, CardMethod::Pix).unwrap_or(0.0);
            TerminalLine {
                name: t.label(),
                debit,
                credit,
                pix,
                total: round2(debit + credit + pix),
            }
        })
        .collect()
}

/// Debit, credit and PIX summed over every terminal.
#[must_use]
pub fn method_totals(lines: &[TerminalLine]) -> MethodTotals {
    MethodTotals {
        debit: round2(lines.iter().map(|l| l.debit).sum()),
        credit: round2(lines.iter().map(|l| l.credit).sum()),
        pix: round2(lines.iter().map(|l| l.pix).sum()),
    }
}

/// Assembles the summary from already-loaded records.
#[must_use]
pub fn summarize(
    register: daily_register::Model,
    withdrawals: &[withdrawal::Model],
    base: Option<(&daily_register::Model, &[withdrawal::Model])>,
    net_factor: f64,
) -> DailySummary {
    let totals = compute_totals(&register, withdrawals, net_factor);

    let base_sales =
        base.map(|(base, base_withdrawals)| compute_totals(base, base_withdrawals, net_factor).total_sales);
    let week_over_week = WeekOverWeek {
        base_date: base.map(|(base, _)| period::format_br(base.date)),
        base_sales,
        percent: week_over_week_percent(totals.total_sales, base_sales),
    };

    let terminals = terminal_lines(&register);
    let method_totals = method_totals(&terminals);

    let ifood = PlatformInfo {
        orders: register.ifood_orders,
        value: register.ifood_sales - register.ifood_cancellations,
        net: totals.ifood_net,
        cancelled: register.ifood_cancellations,
    };
    let food99 = PlatformInfo {
        orders: register.food99_orders,
        value: register.food99_sales,
        net: register.food99_sales,
        cancelled: 0.0,
    };
    let orders = OrderBreakdown {
        counter: register.counter_orders,
        whatsapp: register.whatsapp_orders,
        vuca: register.vuca_orders,
        delivery_fee: register.delivery_fee,
    };

    let withdrawal_lines: Vec<WithdrawalLine> = withdrawals
        .iter()
        .map(|w| WithdrawalLine {
            description: w.description.clone(),
            amount: w.amount,
            payment_method: w.payment_method.clone(),
        })
        .collect();
    let withdrawals_total = round2(withdrawal_lines.iter().map(|w| w.amount).sum());

    DailySummary {
        date_br: period::format_br(register.date),
        weekday: period::weekday_pt(register.date),
        register,
        totals,
        week_over_week,
        terminals,
        method_totals,
        ifood,
        food99,
        orders,
        withdrawals: withdrawal_lines,
        withdrawals_total,
    }
}

/// Loads the register's withdrawals and last week's register, then summarizes.
///
/// The comparison base is the same user's closed register exactly seven days
/// earlier.
pub async fn build_daily_summary(
    db: &DatabaseConnection,
    register: daily_register::Model,
    config: &AppConfig,
) -> Result<DailySummary> {
    let withdrawals = register::withdrawals_for(db, register.id).await?;

    let base = match register.date.checked_sub_days(Days::new(7)) {
        Some(base_date) => register::find_closed_on(db, register.user_id, base_date).await?,
        None => None,
    };
    let base_withdrawals = match &base {
        Some(base) => register::withdrawals_for(db, base.id).await?,
        None => Vec::new(),
    };

    Ok(summarize(
        register,
        &withdrawals,
        base.as_ref().map(|b| (b, base_withdrawals.as_slice())),
        config.cash.ifood_net_factor,
    ))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::register::{ClosingInput, WithdrawalInput};
    use crate::entities::Role;
    use crate::test_utils::*;

    fn cash_withdrawal(amount: f64, method: &str) -> withdrawal::Model {
        withdrawal::Model {
            id: 0,
            description: "Sangria".to_string(),
            amount,
            payment_method: method.to_string(),
            register_id: 1,
        }
    }

    #[test]
    fn test_total_sales_is_cards_plus_cash() {
        // X on cards and Y of cash intake gives X + Y
        let mut register = sample_register();
        register.opening_cash = 100.0;
        register.closing_cash = 350.0;
        register.mp_debit = 120.0;
        register.itau1_credit = 80.0;
        register.c6_pix = 50.0;

        let totals = compute_totals(&register, &[], 0.8);
        assert_eq!(totals.terminal_total, 250.0);
        assert_eq!(totals.cash_intake, 250.0);
        assert_eq!(totals.total_sales, 500.0);
    }

    #[test]
    fn test_cash_conference() {
        let mut register = sample_register();
        register.opening_cash = 100.0;
        register.closing_cash = 260.0;
        register.vuca_counter_cash = 150.0;
        register.vuca_delivery_cash = 50.0;
        let withdrawals = [
            cash_withdrawal(30.0, "Dinheiro"),
            cash_withdrawal(10.0, " DINHEIRO "),
            cash_withdrawal(99.0, "PIX"),
        ];

        let totals = compute_totals(&register, &withdrawals, 0.8);
        assert_eq!(totals.cash_withdrawals, 40.0);
        assert_eq!(totals.expected_cash, 160.0);
        assert_eq!(totals.cash_intake, 160.0);
        assert_eq!(totals.cash_discrepancy, 0.0);
        assert_eq!(totals.cash_sales, 200.0);
    }

    #[test]
    fn test_platforms_orders_and_ticket() {
        let mut register = sample_register();
        register.ifood_sales = 300.0;
        register.ifood_cancellations = 50.0;
        register.food99_sales = 40.0;
        register.ifood_orders = 6;
        register.food99_orders = 1;
        register.counter_orders = 2;
        register.whatsapp_orders = 1;

        let totals = compute_totals(&register, &[], 0.8);
        assert_eq!(totals.ifood_net, 200.0);
        assert_eq!(totals.total_sales, 240.0);
        assert_eq!(totals.total_orders, 10);
        assert_eq!(totals.average_ticket, 24.0);
    }

    #[test]
    fn test_average_ticket_without_orders() {
        let mut register = sample_register();
        register.mp_pix = 10.0;
        assert_eq!(compute_totals(&register, &[], 0.8).average_ticket, 0.0);
    }

    #[test]
    fn test_week_over_week_percent() {
        assert_eq!(week_over_week_percent(150.0, Some(100.0)), 50.0);
        assert_eq!(week_over_week_percent(50.0, Some(100.0)), -50.0);
        assert_eq!(week_over_week_percent(50.0, Some(0.0)), 0.0);
        assert_eq!(week_over_week_percent(50.0, None), 0.0);
    }

    #[test]
    fn test_terminal_lines_and_method_totals() {
        let mut register = sample_register();
        register.mp_debit = 10.0;
        register.itau2_pix = 5.0;
        register.itau3_pix = 2.5;
        register.c6_pix = 1.0;

        let lines = terminal_lines(&register);
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0].name, "Mercado Pago");
        assert_eq!(lines[0].total, 10.0);
        assert_eq!(lines[6].debit, 0.0);
        assert_eq!(lines[6].pix, 1.0);

        let totals = method_totals(&lines);
        assert_eq!(totals.debit, 10.0);
        assert_eq!(totals.credit, 0.0);
        assert_eq!(totals.pix, 8.5);
    }

    #[tokio::test]
    async fn test_build_daily_summary_with_last_week() -> Result<()> {
        let db = setup_test_db().await?;
        let ana = create_test_user(&db, "ana", Role::Caixa).await?;
        let config = AppConfig::default();

        let last_week = ClosingInput {
            mp_debit: 200.0,
            ..Default::default()
        };
        create_closed_register(&db, ana.id, test_date(2024, 3, 1), &last_week).await?;

        let today = ClosingInput {
            mp_debit: 250.0,
            withdrawals: vec![WithdrawalInput {
                description: "Gelo".to_string(),
                amount: 12.5,
                payment_method: "PIX".to_string(),
            }],
            ..Default::default()
        };
        let register = create_closed_register(&db, ana.id, test_date(2024, 3, 8), &today).await?;

        let summary = build_daily_summary(&db, register, &config).await?;
        assert_eq!(summary.date_br, "08/03/2024");
        assert_eq!(summary.weekday, "Sexta-feira");
        assert_eq!(summary.week_over_week.base_date.as_deref(), Some("01/03/2024"));
        assert_eq!(summary.week_over_week.base_sales, Some(200.0));
        assert_eq!(summary.week_over_week.percent, 25.0);
        assert_eq!(summary.withdrawals.len(), 1);
        assert_eq!(summary.withdrawals_total, 12.5);
        Ok(())
    }

    #[tokio::test]
    async fn test_build_daily_summary_without_base() -> Result<()> {
        let db = setup_test_db().await?;
        let ana = create_test_user(&db, "ana", Role::Caixa).await?;
        let bia = create_test_user(&db, "bia", Role::Caixa).await?;

        // Another user's register on the base day does not count
        create_closed_register(&db, bia.id, test_date(2024, 3, 1), &ClosingInput::default())
            .await?;
        let register =
            create_closed_register(&db, ana.id, test_date(2024, 3, 8), &ClosingInput::default())
                .await?;

        let summary = build_daily_summary(&db, register, &AppConfig::default()).await?;
        assert_eq!(summary.week_over_week.base_date, None);
        assert_eq!(summary.week_over_week.base_sales, None);
        assert_eq!(summary.week_over_week.percent, 0.0);
        Ok(())
    }
}
