//! Home page, opening and closing of registers, summaries and history.

use super::today;
use crate::{
    core::{
        money::format_brl,
        period,
        register::{self, ClosingInput, HistoryScope, OPENING_AMOUNT_FIELD},
        summary,
        terminal::{self, Terminal},
        user::list_users,
    },
    entities::daily_register,
    errors::{Error, Result},
    web::{
        AppState,
        error::{flash_back, flash_message},
        flash::{Flash, IncomingFlash, redirect_with},
        session::{AdminUser, CurrentUser},
    },
};
use axum::{
    Form, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use minijinja::context;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use tracing::{info, instrument};

#[derive(Debug, Serialize)]
struct DenominationField {
    label: String,
    name: String,
}

#[derive(Debug, Serialize)]
struct AmountField {
    label: &'static str,
    name: String,
    value: f64,
}

#[derive(Debug, Serialize)]
struct TerminalFields {
    label: &'static str,
    fields: Vec<AmountField>,
}

#[derive(Debug, Serialize)]
struct HistoryRow {
    register: daily_register::Model,
    username: String,
    weekday: &'static str,
    terminal_total: f64,
}

/// Query string of the history page
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// User filter for administrators; blank means everyone
    pub u: Option<String>,
}

fn terminal_fields(register: &daily_register::Model) -> Vec<TerminalFields> {
    Terminal::ALL
        .into_iter()
        .map(|terminal| TerminalFields {
            label: terminal.label(),
            fields: terminal
                .methods()
                .iter()
                .map(|method| AmountField {
                    label: method.label(),
                    name: format!("{}_{}", terminal.key(), method.key()),
                    value: terminal.amount(register, *method).unwrap_or_default(),
                })
                .collect(),
        })
        .collect()
}

/// GET /
pub async fn index(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    flash: IncomingFlash,
) -> Result<Response> {
    let open = register::get_open_register(&*state.db, user.id).await?;
    let today = today();
    let page = state.views.render(
        "index.html",
        context! {
            user => &user,
            flash => flash.message(),
            today => period::format_br(today),
            weekday => period::weekday_pt(today),
            open_register => open,
        },
    )?;
    Ok(flash.respond(page))
}

/// GET /opening
pub async fn opening_page(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    flash: IncomingFlash,
) -> Result<Response> {
    if let Some(open) = register::get_open_register(&*state.db, user.id).await? {
        return Ok(redirect_with(
            &format!("/closing/{}", open.id),
            Flash::info("Você já tem um caixa aberto."),
        ));
    }

    let denominations: Vec<DenominationField> = state
        .config
        .cash
        .denominations
        .iter()
        .map(|d| DenominationField {
            label: format_brl(*d),
            name: register::denomination_field(*d),
        })
        .collect();
    let page = state.views.render(
        "opening.html",
        context! {
            user => &user,
            flash => flash.message(),
            today => period::format_iso(today()),
            denominations => denominations,
            amount_field => OPENING_AMOUNT_FIELD,
        },
    )?;
    Ok(flash.respond(page))
}

/// POST /opening
#[instrument(skip_all, fields(user_id = user.id))]
pub async fn open_register(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Response> {
    let date = period::coerce_date(form.get("date").map(String::as_str), today());
    let opening_cash = register::opening_cash_from_form(&form, &state.config.cash.denominations);

    match register::open_register(&*state.db, user.id, date, opening_cash).await {
        Ok(opened) => Ok(redirect_with(
            &format!("/closing/{}", opened.id),
            Flash::success(format!("Caixa aberto com {}.", format_brl(opening_cash))),
        )),
        Err(e @ Error::RegisterAlreadyOpen { register_id }) => Ok(redirect_with(
            &format!("/closing/{register_id}"),
            Flash::warning(flash_message(&e)),
        )),
        Err(e) => flash_back(e, "/opening"),
    }
}

/// GET /closing/{id}
pub async fn closing_page(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(register_id): Path<i64>,
    flash: IncomingFlash,
) -> Result<Response> {
    let register = register::require_register(&*state.db, register_id).await?;
    if register.user_id != user.id {
        return Err(Error::forbidden("Sem permissão para fechar este caixa."));
    }
    let withdrawals = register::withdrawals_for(&*state.db, register.id).await?;

    let page = state.views.render(
        "closing.html",
        context! {
            user => &user,
            flash => flash.message(),
            date_br => period::format_br(register.date),
            terminals => terminal_fields(&register),
            register => register,
            withdrawals => withdrawals,
        },
    )?;
    Ok(flash.respond(page))
}

/// POST /closing/{id}, answered in JSON for the closing form's script.
#[instrument(skip_all, fields(user_id = user.id, register_id = register_id))]
pub async fn close_register(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(register_id): Path<i64>,
    Json(input): Json<ClosingInput>,
) -> Result<Response> {
    match register::close_register(&*state.db, user.id, register_id, &input).await {
        Ok(closed) => Ok(Json(json!({
            "ok": true,
            "redirect": format!("/summary/{}", closed.id),
        }))
        .into_response()),
        Err(e) if e.is_user_facing() => {
            let status = match e {
                Error::Forbidden { .. } => StatusCode::FORBIDDEN,
                Error::NotFound { .. } => StatusCode::NOT_FOUND,
                _ => StatusCode::BAD_REQUEST,
            };
            Ok((status, Json(json!({ "ok": false, "error": flash_message(&e) }))).into_response())
        }
        Err(e) => Err(e),
    }
}

/// GET /summary/{id}
pub async fn summary(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(register_id): Path<i64>,
    flash: IncomingFlash,
) -> Result<Response> {
    let register = register::require_register(&*state.db, register_id).await?;
    if !register::can_view(&register, &user) {
        return Err(Error::forbidden("Sem permissão para ver este caixa."));
    }
    if register.is_open() {
        return Ok(redirect_with(
            &format!("/closing/{}", register.id),
            Flash::info("Feche o caixa para ver o resumo."),
        ));
    }

    let summary = summary::build_daily_summary(&*state.db, register, &state.config).await?;
    let page = state.views.render(
        "summary.html",
        context! {
            user => &user,
            flash => flash.message(),
            s => summary,
        },
    )?;
    Ok(flash.respond(page))
}

/// GET /history?u=
pub async fn history(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<HistoryQuery>,
    flash: IncomingFlash,
) -> Result<Response> {
    let selected = query.u.as_deref().and_then(|raw| raw.trim().parse::<i64>().ok());
    let scope = if user.is_admin() {
        selected.map_or(HistoryScope::All, HistoryScope::User)
    } else {
        HistoryScope::User(user.id)
    };

    let users = if user.is_admin() {
        list_users(&*state.db).await?
    } else {
        vec![user.clone()]
    };
    let names: HashMap<i64, &str> = users.iter().map(|u| (u.id, u.username.as_str())).collect();

    let rows: Vec<HistoryRow> = register::list_history(&*state.db, scope)
        .await?
        .into_iter()
        .map(|r| HistoryRow {
            username: names.get(&r.user_id).copied().unwrap_or("?").to_string(),
            weekday: period::weekday_pt(r.date),
            terminal_total: terminal::terminals_total(&r),
            register: r,
        })
        .collect();

    let page = state.views.render(
        "history.html",
        context! {
            user => &user,
            flash => flash.message(),
            rows => rows,
            users => if user.is_admin() { users.clone() } else { Vec::new() },
            selected => selected,
        },
    )?;
    Ok(flash.respond(page))
}

/// POST /admin/registers/{id}/delete
#[instrument(skip_all, fields(admin_id = admin.id, register_id = register_id))]
pub async fn delete_register(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(register_id): Path<i64>,
) -> Result<Response> {
    match register::delete_register(&*state.db, register_id).await {
        Ok(()) => {
            info!(register_id, admin_id = admin.id, "Register removed by admin");
            Ok(redirect_with("/history", Flash::success("Caixa removido.")))
        }
        Err(e) => flash_back(e, "/history"),
    }
}
