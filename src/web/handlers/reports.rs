//! Period report.

use super::today;
use crate::{
    core::{period::DateRange, report},
    errors::Result,
    web::{AppState, flash::IncomingFlash, session::AdminUser},
};
use axum::{
    extract::{Query, State},
    response::Response,
};
use minijinja::context;
use serde::Deserialize;

/// Query string of the period report
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    /// First day, current week when absent
    pub start: Option<String>,
    /// Last day, clamped to the report limit
    pub end: Option<String>,
}

/// GET /admin/report?start=&end=
pub async fn period_report(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Query(query): Query<ReportQuery>,
    flash: IncomingFlash,
) -> Result<Response> {
    let range = DateRange::from_query(query.start.as_deref(), query.end.as_deref(), today());
    let report = report::build_period_report(&*state.db, range, &state.config).await?;
    let page = state.views.render(
        "report.html",
        context! {
            user => &admin,
            flash => flash.message(),
            r => report,
        },
    )?;
    Ok(flash.respond(page))
}
