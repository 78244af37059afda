//! How errors reach the browser.
//!
//! Mistakes of the user come back as a flash message on a page they can act on;
//! anything else is logged and answered with a plain error page.

use crate::{
    errors::{Error, Result},
    web::flash::{Flash, redirect_with},
};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tracing::error;

const ERROR_PAGE: &str = include_str!("../../templates/error.html");

/// Message shown to the user for a user-facing error.
#[must_use]
pub fn flash_message(error: &Error) -> String {
    match error {
        Error::Validation { message } | Error::Conflict { message } | Error::Forbidden { message } => {
            message.clone()
        }
        Error::NotFound { .. } => "Registro não encontrado.".to_string(),
        Error::RegisterAlreadyOpen { .. } => {
            "Você já tem um caixa aberto. Feche-o antes de abrir outro.".to_string()
        }
        Error::InvalidCredentials => "Usuário ou senha inválidos.".to_string(),
        Error::Unauthenticated => "Faça login para continuar.".to_string(),
        _ => "Erro inesperado. Tente novamente.".to_string(),
    }
}

/// Turns a user-facing error into a redirect to `back` with the message;
/// other errors are passed on.
pub fn flash_back(error: Error, back: &str) -> Result<Response> {
    if error.is_user_facing() {
        Ok(redirect_with(back, Flash::danger(flash_message(&error))))
    } else {
        Err(error)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self {
            Self::Unauthenticated => redirect_with("/login", Flash::warning(flash_message(&self))),
            Self::Forbidden { .. } => redirect_with("/", Flash::warning(flash_message(&self))),
            e if e.is_user_facing() => redirect_with("/", Flash::danger(flash_message(e))),
            e => {
                error!(error = %e, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, Html(ERROR_PAGE)).into_response()
            }
        }
    }
}
