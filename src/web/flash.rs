//! One-shot messages shown on the next page after a redirect.

use crate::web::session::cookie_value;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
    response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

/// Cookie carrying the pending message
pub const FLASH_COOKIE: &str = "caixa_flash";

/// Severity, also the CSS class of the message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Action completed
    Success,
    /// Neutral notice
    Info,
    /// Action refused or incomplete
    Warning,
    /// Action failed
    Danger,
}

/// A message for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    /// Severity
    pub level: Level,
    /// Text shown to the user
    pub message: String,
}

impl Flash {
    /// Message with the given severity
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    /// [`Level::Success`] message
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Level::Success, message)
    }

    /// [`Level::Info`] message
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Level::Info, message)
    }

    /// [`Level::Warning`] message
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Level::Warning, message)
    }

    /// [`Level::Danger`] message
    pub fn danger(message: impl Into<String>) -> Self {
        Self::new(Level::Danger, message)
    }

    fn encode(&self) -> String {
        serde_json::to_vec(self).map_or_else(|_| String::new(), |json| URL_SAFE_NO_PAD.encode(json))
    }

    fn decode(raw: &str) -> Option<Self> {
        let json = URL_SAFE_NO_PAD.decode(raw).ok()?;
        serde_json::from_slice(&json).ok()
    }

    /// `Set-Cookie` value carrying this message to the next page.
    #[must_use]
    pub fn cookie(&self) -> String {
        format!(
            "{FLASH_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age=60",
            self.encode()
        )
    }
}

fn clear_cookie() -> String {
    format!("{FLASH_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Redirects to `to` and shows `flash` there.
pub fn redirect_with(to: &str, flash: Flash) -> Response {
    (
        AppendHeaders([(header::SET_COOKIE, flash.cookie())]),
        Redirect::to(to),
    )
        .into_response()
}

/// Message left by the previous response, if any.
#[derive(Debug, Clone, Default)]
pub struct IncomingFlash(pub Option<Flash>);

impl IncomingFlash {
    /// The pending message, if any
    #[must_use]
    pub const fn message(&self) -> Option<&Flash> {
        self.0.as_ref()
    }

    /// Responds with the page and drops the message so it shows only once.
    pub fn respond(self, page: Html<String>) -> Response {
        if self.0.is_some() {
            (AppendHeaders([(header::SET_COOKIE, clear_cookie())]), page).into_response()
        } else {
            page.into_response()
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for IncomingFlash {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            cookie_value(&parts.headers, FLASH_COOKIE).and_then(Flash::decode),
        ))
    }
}
