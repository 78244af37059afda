//! User administration.

use crate::{
    core::user::{self, ResetOutcome},
    entities::Role,
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
    extract::{Path, State},
    response::Response,
};
use minijinja::context;
use serde::Deserialize;
use tracing::instrument;

const USERS_PAGE: &str = "/admin/users";

/// New account form fields
#[derive(Debug, Deserialize)]
pub struct NewUserForm {
    /// Account name
    #[serde(default)]
    pub username: String,
    /// Initial password
    #[serde(default)]
    pub password: String,
    /// Role name; unknown values become `user`
    #[serde(default)]
    pub role: String,
}

/// Password reset form fields
#[derive(Debug, Default, Deserialize)]
pub struct ResetForm {
    /// New password; blank generates a temporary one
    #[serde(default)]
    pub password: String,
}

/// GET /admin/users
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    flash: IncomingFlash,
) -> Result<Response> {
    let users = user::list_users(&*state.db).await?;
    let page = state.views.render(
        "admin_users.html",
        context! {
            user => &admin,
            flash => flash.message(),
            users => users,
            roles => [Role::Admin.as_str(), Role::User.as_str(), Role::Caixa.as_str()],
        },
    )?;
    Ok(flash.respond(page))
}

/// POST /admin/users
#[instrument(skip_all, fields(admin_id = admin.id))]
pub async fn create_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Form(form): Form<NewUserForm>,
) -> Result<Response> {
    let role = Role::parse_or_default(&form.role);
    match user::create_user(&*state.db, &form.username, &form.password, role).await {
        Ok(created) => Ok(redirect_with(
            USERS_PAGE,
            Flash::success(format!("Usuário '{}' criado.", created.username)),
        )),
        Err(e) => flash_back(e, USERS_PAGE),
    }
}

/// POST /admin/users/{id}/reset
#[instrument(skip_all, fields(admin_id = admin.id, user_id = user_id))]
pub async fn reset_password(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<i64>,
    Form(form): Form<ResetForm>,
) -> Result<Response> {
    match user::reset_password(&*state.db, user_id, Some(form.password.as_str())).await {
        Ok(ResetOutcome::Custom) => Ok(redirect_with(
            USERS_PAGE,
            Flash::success("Senha redefinida."),
        )),
        Ok(ResetOutcome::Generated(password)) => Ok(redirect_with(
            USERS_PAGE,
            Flash::info(format!("Senha temporária: {password}")),
        )),
        Err(e) => flash_back(e, USERS_PAGE),
    }
}

/// POST /admin/users/{id}/delete
#[instrument(skip_all, fields(admin_id = admin.id, user_id = user_id))]
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<i64>,
) -> Result<Response> {
    match user::delete_user(&*state.db, admin.id, user_id).await {
        Ok(()) => Ok(redirect_with(USERS_PAGE, Flash::success("Usuário removido."))),
        Err(e) => flash_back(e, USERS_PAGE),
    }
}
