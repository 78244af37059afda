//! Login and logout.

use crate::{
    core::auth,
    errors::{Error, Result},
    web::{
        AppState,
        error::flash_back,
        flash::{Flash, IncomingFlash, redirect_with},
        session::{self, CurrentUser},
    },
};
use axum::{
    Form,
    extract::State,
    http::header,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use minijinja::context;
use serde::Deserialize;
use tracing::info;

/// Login form fields
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    /// Account name
    #[serde(default)]
    pub username: String,
    /// Plain password, checked against the stored hash
    #[serde(default)]
    pub password: String,
}

/// GET /login
pub async fn login_page(State(state): State<AppState>, flash: IncomingFlash) -> Result<Response> {
    let page = state
        .views
        .render("login.html", context! { flash => flash.message() })?;
    Ok(flash.respond(page))
}

/// POST /login
pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Result<Response> {
    let user = match auth::authenticate(&*state.db, &form.username, &form.password).await {
        Ok(user) => user,
        Err(e @ Error::InvalidCredentials) => return flash_back(e, "/login"),
        Err(e) => return Err(e),
    };

    let token = state.sessions.issue(&user)?;
    let flash = Flash::success(format!("Bem-vindo, {}!", user.username));
    Ok((
        AppendHeaders([
            (header::SET_COOKIE, state.sessions.cookie(&token)),
            (header::SET_COOKIE, flash.cookie()),
        ]),
        Redirect::to("/"),
    )
        .into_response())
}

/// GET /logout
pub async fn logout(CurrentUser(user): CurrentUser) -> Response {
    info!(user_id = user.id, username = %user.username, "User logged out");
    (
        AppendHeaders([(header::SET_COOKIE, session::clear_cookie())]),
        redirect_with("/login", Flash::success("Você saiu do sistema.")),
    )
        .into_response()
}
