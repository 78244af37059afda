//! Ledger business logic - Expenses recorded outside the register flow.
//!
//! Entries belong to the user who recorded them; only that user may edit or delete
//! them. Listings are filtered by period, category and payment method and come
//! with the totals and the day pivot shown on the ledger page.

use crate::{
    core::{
        money::round2,
        period::DateRange,
        report::{self, PivotGroup},
    },
    entities::{EntryType, LedgerEntry, ledger_entry},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

/// Category used when none was given.
pub const DEFAULT_CATEGORY: &str = "OUTROS";

/// Longest period a listing covers; the day pivot has one column per day.
pub const MAX_LEDGER_DAYS: u64 = report::MAX_REPORT_DAYS;

/// Validated contents of the ledger form.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerInput {
    /// Day the expense happened
    pub date: NaiveDate,
    /// Purchase or other outflow
    pub entry_type: EntryType,
    /// Expense group; blank becomes [`DEFAULT_CATEGORY`]
    pub category: String,
    /// Supplier or free text
    pub description: String,
    /// Must be greater than zero
    pub amount: f64,
    /// How it was paid
    pub payment_method: String,
}

/// Which entries a listing shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerFilter {
    /// Days covered, both ends included
    pub range: DateRange,
    /// Exact category, `None` for all
    pub category: Option<String>,
    /// Exact payment method, `None` for all
    pub payment_method: Option<String>,
}

impl LedgerFilter {
    /// Filter for `range`, limited to [`MAX_LEDGER_DAYS`] after its start.
    #[must_use]
    pub fn new(range: DateRange, category: Option<String>, payment_method: Option<String>) -> Self {
        Self {
            range: range.clamp_days(MAX_LEDGER_DAYS),
            category,
            payment_method,
        }
    }
}

/// Totals shown next to a listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerSummary {
    /// Sum of every listed entry
    pub total: f64,
    /// `(category, total)` pairs ordered case-insensitively
    pub by_category: Vec<(String, f64)>,
    /// `(payment method, total)` pairs ordered case-insensitively
    pub by_payment_method: Vec<(String, f64)>,
    /// `DD/MM` header of each pivot column
    pub day_labels: Vec<String>,
    /// Entries spread over the days of the period
    pub pivot: Vec<PivotGroup>,
}

fn normalized_category(raw: &str) -> String {
    let category = raw.trim();
    if category.is_empty() {
        DEFAULT_CATEGORY.to_string()
    } else {
        category.to_string()
    }
}

fn validate(input: &LedgerInput) -> Result<()> {
    if !input.amount.is_finite() || input.amount <= 0.0 {
        return Err(Error::validation("Informe um valor maior que zero."));
    }
    Ok(())
}

/// Creates an entry, or updates entry `edit_id` when given.
///
/// Editing someone else's entry fails with [`Error::Forbidden`].
pub async fn save_entry(
    db: &DatabaseConnection,
    actor_id: i64,
    edit_id: Option<i64>,
    input: LedgerInput,
) -> Result<ledger_entry::Model> {
    validate(&input)?;

    let mut entry: ledger_entry::ActiveModel = match edit_id {
        Some(id) => {
            let existing = LedgerEntry::find_by_id(id)
                .one(db)
                .await?
                .ok_or(Error::NotFound {
                    entity: "Ledger entry",
                    id,
                })?;
            if existing.user_id != actor_id {
                return Err(Error::forbidden(
                    "Sem permissão para editar este lançamento.",
                ));
            }
            existing.into()
        }
        None => ledger_entry::ActiveModel {
            user_id: Set(actor_id),
            ..Default::default()
        },
    };

    entry.date = Set(input.date);
    entry.entry_type = Set(input.entry_type);
    entry.category = Set(normalized_category(&input.category));
    entry.description = Set(input.description.trim().to_string());
    entry.amount = Set(input.amount);
    entry.payment_method = Set(input.payment_method.trim().to_string());

    let saved = if edit_id.is_some() {
        entry.update(db).await?
    } else {
        entry.insert(db).await?
    };
    info!(
        entry_id = saved.id,
        actor_id,
        edited = edit_id.is_some(),
        category = %saved.category,
        amount = saved.amount,
        "Ledger entry saved"
    );
    Ok(saved)
}

/// Deletes one of the actor's entries.
pub async fn delete_entry(db: &DatabaseConnection, actor_id: i64, entry_id: i64) -> Result<()> {
    let entry = LedgerEntry::find_by_id(entry_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "Ledger entry",
            id: entry_id,
        })?;
    if entry.user_id != actor_id {
        return Err(Error::forbidden("Sem permissão."));
    }
    entry.delete(db).await?;
    info!(entry_id, actor_id, "Ledger entry deleted");
    Ok(())
}

/// The user's entries matching the filter, newest first.
pub async fn list_entries(
    db: &DatabaseConnection,
    user_id: i64,
    filter: &LedgerFilter,
) -> Result<Vec<ledger_entry::Model>> {
    let mut query = LedgerEntry::find()
        .filter(ledger_entry::Column::UserId.eq(user_id))
        .filter(ledger_entry::Column::Date.between(filter.range.start, filter.range.end));
    if let Some(category) = &filter.category {
        query = query.filter(ledger_entry::Column::Category.eq(category.trim()));
    }
    if let Some(method) = &filter.payment_method {
        query = query.filter(ledger_entry::Column::PaymentMethod.eq(method.trim()));
    }
    query
        .order_by_desc(ledger_entry::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Entries of every user in the range.
pub async fn entries_between(
    db: &DatabaseConnection,
    range: DateRange,
) -> Result<Vec<ledger_entry::Model>> {
    LedgerEntry::find()
        .filter(ledger_entry::Column::Date.between(range.start, range.end))
        .order_by_asc(ledger_entry::Column::Date)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Sums grouped by key, ordered case-insensitively.
fn totals_by<F>(entries: &[ledger_entry::Model], key: F) -> Vec<(String, f64)>
where
    F: Fn(&ledger_entry::Model) -> &str,
{
    let mut sums: BTreeMap<(String, String), f64> = BTreeMap::new();
    for entry in entries {
        let label = key(entry).to_string();
        *sums.entry((label.to_lowercase(), label)).or_default() += entry.amount;
    }
    sums.into_iter()
        .map(|((_, label), total)| (label, round2(total)))
        .collect()
}

/// Period total, totals by category and payment method, and the day pivot.
///
/// The pivot never spans more than [`MAX_LEDGER_DAYS`] days past the start.
#[must_use]
pub fn summarize(entries: &[ledger_entry::Model], range: DateRange) -> LedgerSummary {
    let range = range.clamp_days(MAX_LEDGER_DAYS);
    LedgerSummary {
        total: round2(entries.iter().map(|e| e.amount).sum()),
        by_category: totals_by(entries, |e| e.category.as_str()),
        by_payment_method: totals_by(entries, |e| e.payment_method.as_str()),
        day_labels: range.day_labels(),
        pivot: report::build_pivot(entries, range, false),
    }
}
