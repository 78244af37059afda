//! Report generation business logic.
//!
//! This module builds the period report shown to administrators: card and PIX
//! takings per terminal and day, the acquirer fee table, and the day pivot of
//! ledger entries. All functions except [`build_period_report`] work on
//! already-fetched rows and return structured data for the view layer.

use crate::{
    config::{AppConfig, settings::FeeTable},
    core::{
        ledger::{self, DEFAULT_CATEGORY},
        money::round2,
        period::{self, DateRange},
        register,
        terminal::{self, CardMethod, Terminal},
    },
    entities::{daily_register, ledger_entry},
    errors::Result,
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Longest period a report covers, counted in days after the start.
pub const MAX_REPORT_DAYS: u64 = 31;

const BLANK_DESCRIPTION: &str = "—";

/// One description line of a pivot group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotRow {
    /// Entry description, `—` when blank
    pub description: String,
    /// One value per day of the range
    pub values: Vec<f64>,
    /// Sum of the row
    pub total: f64,
}

/// Ledger entries of one category spread over the days of a range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotGroup {
    /// Category name
    pub category: String,
    /// One row per description
    pub rows: Vec<PivotRow>,
    /// Per-day totals of the kept rows
    pub totals: Vec<f64>,
    /// Sum of the group
    pub total: f64,
}

/// Takings of one terminal and method over the days of a range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TerminalRow {
    /// Terminal and method, e.g. `"Mercado Pago Débito"`
    pub label: String,
    /// One value per day of the range
    pub values: Vec<f64>,
    /// Sum of the row
    pub total: f64,
}

/// Per-day totals of one payment method across every terminal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodDayTotals {
    /// Method label
    pub method: &'static str,
    /// One value per day of the range
    pub values: Vec<f64>,
}

/// One line of the acquirer fee table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeeRow {
    /// Acquirer name
    pub brand: &'static str,
    /// Method label
    pub method: &'static str,
    /// Takings of the brand and method in the period
    pub gross: f64,
    /// Fraction charged by the acquirer, `0.0199` for 1.99%
    pub percent: f64,
    /// Amount kept by the acquirer, rounded to cents
    pub fee: f64,
    /// Gross minus fee, rounded to cents
    pub net: f64,
    /// Net of every method of the same brand
    pub brand_net_total: f64,
}

/// Everything the period report page shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodReport {
    /// First day, `YYYY-MM-DD`
    pub start_iso: String,
    /// Last day after clamping, `YYYY-MM-DD`
    pub end_iso: String,
    /// `DD/MM – DD/MM` heading
    pub period_label: String,
    /// `DD/MM` header of each day column
    pub day_labels: Vec<String>,
    /// Closed registers found in the period
    pub registers_count: usize,
    /// Terminal takings per day
    pub terminal_rows: Vec<TerminalRow>,
    /// Takings per method per day
    pub method_totals: Vec<MethodDayTotals>,
    /// Acquirer fee table
    pub fee_rows: Vec<FeeRow>,
    /// Ledger entries of every user, non-positive rows dropped
    pub pivot: Vec<PivotGroup>,
}

fn trimmed_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    let value = value.trim();
    if value.is_empty() { fallback } else { value }
}

/// Groups ledger entries by category and description with one column per day.
///
/// Entries outside `range` are ignored. Categories and descriptions are ordered
/// case-insensitively. With `drop_non_positive` set, rows and groups whose total
/// is not positive are left out, which is how the period report shows them.
#[must_use]
pub fn build_pivot(
    entries: &[ledger_entry::Model],
    range: DateRange,
    drop_non_positive: bool,
) -> Vec<PivotGroup> {
    let days = range.day_count();
    let mut grouped: BTreeMap<(String, String), BTreeMap<(String, String), Vec<f64>>> =
        BTreeMap::new();

    for entry in entries {
        let Some(index) = range.index_of(entry.date) else {
            continue;
        };
        let category = trimmed_or(&entry.category, DEFAULT_CATEGORY);
        let description = trimmed_or(&entry.description, BLANK_DESCRIPTION);
        let values = grouped
            .entry((category.to_lowercase(), category.to_string()))
            .or_default()
            .entry((description.to_lowercase(), description.to_string()))
            .or_insert_with(|| vec![0.0; days]);
        values[index] += entry.amount;
    }

    let mut groups = Vec::with_capacity(grouped.len());
    for ((_, category), descriptions) in grouped {
        let mut totals = vec![0.0; days];
        let mut rows = Vec::with_capacity(descriptions.len());
        for ((_, description), values) in descriptions {
            let total: f64 = values.iter().sum();
            if drop_non_positive && total <= 0.0 {
                continue;
            }
            for (column, value) in totals.iter_mut().zip(&values) {
                *column += value;
            }
            rows.push(PivotRow {
                description,
                values: values.into_iter().map(round2).collect(),
                total: round2(total),
            });
        }

        let total: f64 = totals.iter().sum();
        if drop_non_positive && total <= 0.0 {
            continue;
        }
        groups.push(PivotGroup {
            category,
            rows,
            totals: totals.into_iter().map(round2).collect(),
            total: round2(total),
        });
    }
    groups
}

/// Card and PIX takings per terminal and method, one column per day.
///
/// Returns the rows in terminal order plus the per-day totals of each method.
#[must_use]
pub fn terminal_rows(
    registers: &[daily_register::Model],
    range: DateRange,
) -> (Vec<TerminalRow>, Vec<MethodDayTotals>) {
    let days = range.day_count();
    let mut by_method: Vec<(CardMethod, Vec<f64>)> = CardMethod::ALL
        .iter()
        .map(|method| (*method, vec![0.0; days]))
        .collect();
    let mut rows = Vec::new();

    for terminal in Terminal::ALL {
        for method in terminal.methods() {
            let mut values = vec![0.0; days];
            for register in registers {
                if let (Some(index), Some(amount)) =
                    (range.index_of(register.date), terminal.amount(register, *method))
                {
                    values[index] += amount;
                }
            }
            if let Some((_, totals)) = by_method.iter_mut().find(|(m, _)| m == method) {
                for (column, value) in totals.iter_mut().zip(&values) {
                    *column += value;
                }
            }
            let total = values.iter().sum();
            rows.push(TerminalRow {
                label: format!("{} {}", terminal.label(), method.label()),
                values: values.into_iter().map(round2).collect(),
                total: round2(total),
            });
        }
    }

    let method_totals = by_method
        .into_iter()
        .map(|(method, values)| MethodDayTotals {
            method: method.label(),
            values: values.into_iter().map(round2).collect(),
        })
        .collect();
    (rows, method_totals)
}

/// Acquirer fee table over the given registers.
///
/// Terminals of the same brand are summed together. Fee and net are rounded to
/// cents per line; the brand net total is the sum of the rounded nets.
#[must_use]
pub fn fee_table(registers: &[daily_register::Model], fees: &FeeTable) -> Vec<FeeRow> {
    let mut rows = Vec::new();
    for brand in terminal::brands() {
        let terminals: Vec<Terminal> = Terminal::ALL
            .into_iter()
            .filter(|t| t.brand() == brand)
            .collect();
        let first = rows.len();
        let mut brand_net_total = 0.0;

        for method in CardMethod::ALL {
            if !terminals.iter().any(|t| t.methods().contains(&method)) {
                continue;
            }
            let gross: f64 = registers
                .iter()
                .flat_map(|register| terminals.iter().filter_map(move |t| t.amount(register, method)))
                .sum();
            let percent = fees.percent(brand, method);
            let fee = round2(gross * percent);
            let net = round2(gross - fee);
            brand_net_total += net;
            rows.push(FeeRow {
                brand,
                method: method.label(),
                gross: round2(gross),
                percent,
                fee,
                net,
                brand_net_total: 0.0,
            });
        }

        let brand_net_total = round2(brand_net_total);
        for row in &mut rows[first..] {
            row.brand_net_total = brand_net_total;
        }
    }
    rows
}

/// Builds the period report for the range, limited to [`MAX_REPORT_DAYS`].
///
/// Covers the closed registers and the ledger entries of every user.
pub async fn build_period_report(
    db: &DatabaseConnection,
    range: DateRange,
    config: &AppConfig,
) -> Result<PeriodReport> {
    let range = range.clamp_days(MAX_REPORT_DAYS);
    let registers = register::closed_registers_between(db, range).await?;
    let entries = ledger::entries_between(db, range).await?;
    debug!(
        start = %range.start,
        end = %range.end,
        registers = registers.len(),
        entries = entries.len(),
        "Building period report"
    );

    let day_labels = range.day_labels();
    let period_label = format!(
        "{} – {}",
        period::format_day_label(range.start),
        period::format_day_label(range.end)
    );
    let (terminal_rows, method_totals) = terminal_rows(&registers, range);

    Ok(PeriodReport {
        start_iso: period::format_iso(range.start),
        end_iso: period::format_iso(range.end),
        period_label,
        day_labels,
        registers_count: registers.len(),
        terminal_rows,
        method_totals,
        fee_rows: fee_table(&registers, &config.fees),
        pivot: build_pivot(&entries, range, true),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::register::ClosingInput;
    use crate::entities::Role;
    use crate::test_utils::*;

    fn week() -> DateRange {
        DateRange::new(test_date(2024, 3, 4), test_date(2024, 3, 10))
    }

    #[test]
    fn test_pivot_groups_and_sorts() {
        let entries = vec![
            sample_entry(test_date(2024, 3, 4), "mercado", "Leite", 10.0, "PIX"),
            sample_entry(test_date(2024, 3, 5), "Bebidas", "Ambev", 30.0, "PIX"),
            sample_entry(test_date(2024, 3, 5), "mercado", "arroz", 5.0, "PIX"),
            sample_entry(test_date(2024, 3, 6), "mercado", "Leite", 2.5, "PIX"),
            sample_entry(test_date(2024, 3, 6), "", "  ", 7.0, "PIX"),
            // Outside the range
            sample_entry(test_date(2024, 3, 11), "mercado", "Leite", 99.0, "PIX"),
        ];

        let pivot = build_pivot(&entries, week(), false);
        let categories: Vec<_> = pivot.iter().map(|g| g.category.as_str()).collect();
        assert_eq!(categories, vec!["Bebidas", "mercado", "OUTROS"]);

        let mercado = &pivot[1];
        let descriptions: Vec<_> = mercado.rows.iter().map(|r| r.description.as_str()).collect();
        assert_eq!(descriptions, vec!["arroz", "Leite"]);
        assert_eq!(mercado.rows[1].values, vec![10.0, 0.0, 2.5, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(mercado.rows[1].total, 12.5);
        assert_eq!(mercado.totals, vec![10.0, 5.0, 2.5, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(mercado.total, 17.5);

        assert_eq!(pivot[2].rows[0].description, "—");
        assert_eq!(pivot[2].total, 7.0);
    }

    #[test]
    fn test_pivot_report_mode_drops_non_positive() {
        let entries = vec![
            sample_entry(test_date(2024, 3, 4), "MERCADO", "Leite", 10.0, "PIX"),
            sample_entry(test_date(2024, 3, 4), "MERCADO", "Estorno", -4.0, "PIX"),
            sample_entry(test_date(2024, 3, 5), "AJUSTE", "Zerado", 0.0, "PIX"),
        ];

        let ledger_view = build_pivot(&entries, week(), false);
        assert_eq!(ledger_view.len(), 2);

        let report_view = build_pivot(&entries, week(), true);
        assert_eq!(report_view.len(), 1);
        assert_eq!(report_view[0].category, "MERCADO");
        assert_eq!(report_view[0].rows.len(), 1);
        assert_eq!(report_view[0].total, 10.0);
    }

    #[test]
    fn test_terminal_rows_per_day() {
        let mut monday = sample_register();
        monday.date = test_date(2024, 3, 4);
        monday.mp_debit = 100.0;
        monday.itau2_credit = 50.0;
        monday.c6_pix = 20.0;
        let mut tuesday = monday.clone();
        tuesday.date = test_date(2024, 3, 5);
        tuesday.mp_debit = 40.0;
        tuesday.itau2_credit = 0.0;
        tuesday.c6_pix = 0.0;

        let (rows, method_totals) = terminal_rows(&[monday, tuesday], week());
        // Six terminals with three methods plus the PIX-only C6
        assert_eq!(rows.len(), 19);
        assert_eq!(rows[0].label, "Mercado Pago Débito");
        assert_eq!(rows[0].values[..2], [100.0, 40.0]);
        assert_eq!(rows[0].total, 140.0);
        assert_eq!(rows[18].label, "C6 (PIX CNPJ) PIX");
        assert_eq!(rows[18].total, 20.0);

        assert_eq!(method_totals.len(), 3);
        assert_eq!(method_totals[0].method, "Débito");
        assert_eq!(method_totals[0].values[..2], [100.0, 40.0]);
        assert_eq!(method_totals[1].values[0], 50.0);
        assert_eq!(method_totals[2].values[0], 20.0);
    }

    #[test]
    fn test_fee_table_arithmetic() {
        let mut register = sample_register();
        register.mp_credit = 1000.0;
        register.itau1_debit = 100.0;
        register.itau3_debit = 200.0;
        register.c6_pix = 80.0;

        let rows = fee_table(&[register], &FeeTable::default());
        // Five brands: four with three methods, C6 with PIX only
        assert_eq!(rows.len(), 13);

        let mp_credit = rows
            .iter()
            .find(|r| r.brand == "Mercado Pago" && r.method == "Crédito")
            .unwrap();
        assert_eq!(mp_credit.gross, 1000.0);
        assert_eq!(mp_credit.percent, 0.0498);
        assert_eq!(mp_credit.fee, 49.8);
        assert_eq!(mp_credit.net, 950.2);
        assert_eq!(mp_credit.brand_net_total, 950.2);

        let itau_debit = rows
            .iter()
            .find(|r| r.brand == "Itaú" && r.method == "Débito")
            .unwrap();
        assert_eq!(itau_debit.gross, 300.0);
        assert_eq!(itau_debit.fee, 2.91);
        assert_eq!(itau_debit.net, 297.09);

        let c6: Vec<_> = rows.iter().filter(|r| r.brand == "C6 (PIX CNPJ)").collect();
        assert_eq!(c6.len(), 1);
        assert_eq!(c6[0].net, 80.0);
        assert_eq!(c6[0].brand_net_total, 80.0);
    }

    #[tokio::test]
    async fn test_build_period_report_integration() -> Result<()> {
        let db = setup_test_db().await?;
        let maria = create_test_user(&db, "maria", Role::Caixa).await?;
        let admin = create_test_user(&db, "admin", Role::Admin).await?;

        let closing = ClosingInput {
            closing_cash: 100.0,
            mp_debit: 150.0,
            ..ClosingInput::default()
        };
        create_closed_register(&db, maria.id, test_date(2024, 3, 5), &closing).await?;
        // Open registers stay out of the report
        create_test_register(&db, admin.id, test_date(2024, 3, 6)).await?;

        crate::core::ledger::save_entry(
            &db,
            admin.id,
            None,
            crate::core::ledger::LedgerInput {
                date: test_date(2024, 3, 7),
                entry_type: crate::entities::EntryType::Purchase,
                category: "GÁS".to_string(),
                description: "Botijão".to_string(),
                amount: 110.0,
                payment_method: "PIX".to_string(),
            },
        )
        .await?;

        let report = build_period_report(&db, week(), &AppConfig::default()).await?;
        assert_eq!(report.start_iso, "2024-03-04");
        assert_eq!(report.end_iso, "2024-03-10");
        assert_eq!(report.period_label, "04/03 – 10/03");
        assert_eq!(report.day_labels.len(), 7);
        assert_eq!(report.registers_count, 1);
        assert_eq!(report.terminal_rows[0].values[1], 150.0);
        assert_eq!(report.pivot.len(), 1);
        assert_eq!(report.pivot[0].totals[3], 110.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_build_period_report_clamps_range() -> Result<()> {
        let db = setup_test_db().await?;
        let range = DateRange::new(test_date(2024, 1, 1), test_date(2024, 6, 30));

        let report = build_period_report(&db, range, &AppConfig::default()).await?;
        assert_eq!(report.end_iso, "2024-02-01");
        assert_eq!(report.day_labels.len(), 32);
        Ok(())
    }
}
