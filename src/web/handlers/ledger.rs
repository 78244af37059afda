//! Expense ledger pages.

use super::today;
use crate::{
    core::{
        ledger::{self, LedgerFilter, LedgerInput},
        money::parse_brl,
        period::{self, DateRange},
    },
    entities::EntryType,
    errors::Result,
    web::{
        AppState,
        error::flash_back,
        flash::{Flash, IncomingFlash, redirect_with},
        session::AdminUser,
    },
};
use axum::{
    Form,
    extract::{Path, Query, State},
    response::Response,
};
use minijinja::context;
use serde::Deserialize;
use tracing::instrument;

const LEDGER_PAGE: &str = "/admin/ledger";

/// Filters of the ledger page
#[derive(Debug, Default, Deserialize)]
pub struct LedgerQuery {
    /// First day, current week when absent
    pub start: Option<String>,
    /// Last day, limited to the listing maximum
    pub end: Option<String>,
    /// Exact category; blank for all
    pub category: Option<String>,
    /// Exact payment method; blank for all
    pub method: Option<String>,
    /// Entry loaded into the form for editing
    pub edit: Option<String>,
}

/// Ledger entry form fields, all raw text
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LedgerForm {
    /// Set when editing an existing entry
    pub id: String,
    /// `YYYY-MM-DD` or `DD/MM/YYYY`; today when invalid
    pub date: String,
    /// `purchase` or `outflow`
    pub entry_type: String,
    /// Expense group
    pub category: String,
    /// Supplier or free text
    pub description: String,
    /// BRL amount, e.g. `1.234,56`
    pub amount: String,
    /// How it was paid
    pub payment_method: String,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl LedgerForm {
    fn edit_id(&self) -> Option<i64> {
        self.id.trim().parse().ok()
    }

    fn into_input(self) -> LedgerInput {
        LedgerInput {
            date: period::coerce_date(Some(self.date.as_str()), today()),
            entry_type: EntryType::parse_or_default(&self.entry_type),
            category: self.category,
            description: self.description,
            amount: parse_brl(&self.amount),
            payment_method: self.payment_method,
        }
    }
}

/// GET /admin/ledger
pub async fn ledger_page(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Query(query): Query<LedgerQuery>,
    flash: IncomingFlash,
) -> Result<Response> {
    let filter = LedgerFilter::new(
        DateRange::from_query(query.start.as_deref(), query.end.as_deref(), today()),
        non_blank(query.category),
        non_blank(query.method),
    );
    let range = filter.range;
    let entries = ledger::list_entries(&*state.db, admin.id, &filter).await?;
    let summary = ledger::summarize(&entries, range);
    let editing = non_blank(query.edit)
        .and_then(|raw| raw.parse::<i64>().ok())
        .and_then(|id| entries.iter().find(|e| e.id == id).cloned());

    let page = state.views.render(
        "ledger.html",
        context! {
            user => &admin,
            flash => flash.message(),
            start_iso => period::format_iso(range.start),
            end_iso => period::format_iso(range.end),
            today => period::format_iso(today()),
            category => filter.category,
            method => filter.payment_method,
            categories => &state.config.ledger.categories,
            payment_methods => &state.config.ledger.payment_methods,
            entries => entries,
            summary => summary,
            editing => editing,
        },
    )?;
    Ok(flash.respond(page))
}

/// POST /admin/ledger
#[instrument(skip_all, fields(admin_id = admin.id))]
pub async fn save_entry(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Form(form): Form<LedgerForm>,
) -> Result<Response> {
    let edit_id = form.edit_id();
    match ledger::save_entry(&*state.db, admin.id, edit_id, form.into_input()).await {
        Ok(_) => {
            let message = if edit_id.is_some() {
                "Lançamento atualizado."
            } else {
                "Lançamento registrado."
            };
            Ok(redirect_with(LEDGER_PAGE, Flash::success(message)))
        }
        Err(e) => flash_back(e, LEDGER_PAGE),
    }
}

/// POST /admin/ledger/{id}/delete
#[instrument(skip_all, fields(admin_id = admin.id, entry_id = entry_id))]
pub async fn delete_entry(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(entry_id): Path<i64>,
) -> Result<Response> {
    match ledger::delete_entry(&*state.db, admin.id, entry_id).await {
        Ok(()) => Ok(redirect_with(LEDGER_PAGE, Flash::success("Lançamento removido."))),
        Err(e) => flash_back(e, LEDGER_PAGE),
    }
}
