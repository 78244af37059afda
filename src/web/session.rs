//! Login sessions carried in a signed cookie.
//!
//! The cookie holds an HS256 JWT naming the user. Every request loads the user
//! again, so deleted accounts lose access immediately and role changes apply on
//! the next request.

use crate::{
    core::user::get_user_by_id,
    entities::user,
    errors::{Error, Result},
    web::AppState,
};
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Cookie carrying the session token
pub const SESSION_COOKIE: &str = "caixa_session";

/// JWT claims of a login session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id
    pub sub: i64,
    /// Username at login time
    pub username: String,
    /// Role name at login time
    pub role: String,
    /// Expiration (Unix timestamp seconds)
    pub exp: u64,
    /// Issued at (Unix timestamp seconds)
    pub iat: u64,
}

/// Signing keys and lifetime of session tokens.
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime: Duration,
}

impl SessionKeys {
    /// Keys derived from `secret`; tokens live `lifetime_minutes`, at least one
    #[must_use]
    pub fn new(secret: &str, lifetime_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime: Duration::minutes(lifetime_minutes.max(1)),
        }
    }

    /// Signs a session token for the user.
    pub fn issue(&self, user: &user::Model) -> Result<String> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: user.id,
            username: user.username.clone(),
            role: user.role.as_str().to_string(),
            exp: u64::try_from((now + self.lifetime).timestamp()).unwrap_or_default(),
            iat: u64::try_from(now.timestamp()).unwrap_or_default(),
        };
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding,
        )?)
    }

    /// Checks signature and expiry of a session token.
    pub fn verify(&self, token: &str) -> Result<SessionClaims> {
        let data = jsonwebtoken::decode::<SessionClaims>(
            token,
            &self.decoding,
            &Validation::new(Algorithm::HS256),
        )?;
        Ok(data.claims)
    }

    /// `Set-Cookie` value storing the token.
    #[must_use]
    pub fn cookie(&self, token: &str) -> String {
        format!(
            "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.lifetime.num_seconds()
        )
    }
}

/// `Set-Cookie` value removing the session.
#[must_use]
pub fn clear_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Value of the named cookie in the request headers.
#[must_use]
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// The logged-in user.
///
/// Rejects with [`Error::Unauthenticated`] when there is no valid session.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub user::Model);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        if let Some(current) = parts.extensions.get::<Self>() {
            return Ok(current.clone());
        }

        let token = cookie_value(&parts.headers, SESSION_COOKIE).ok_or(Error::Unauthenticated)?;
        let claims = state.sessions.verify(token).map_err(|e| {
            debug!(error = %e, uri = %parts.uri, "Rejected session cookie");
            Error::Unauthenticated
        })?;
        let user = get_user_by_id(&*state.db, claims.sub)
            .await?
            .ok_or_else(|| {
                warn!(user_id = claims.sub, "Session of a deleted user");
                Error::Unauthenticated
            })?;

        let current = Self(user);
        parts.extensions.insert(current.clone());
        Ok(current)
    }
}

/// The logged-in user, who must be an administrator.
#[derive(Debug, Clone)]
pub struct AdminUser(pub user::Model);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if user.is_admin() {
            Ok(Self(user))
        } else {
            warn!(user_id = user.id, uri = %parts.uri, "Non-admin tried an admin page");
            Err(Error::forbidden("Acesso restrito ao administrador."))
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entities::Role;
    use crate::test_utils::sample_user;
    use axum::http::HeaderValue;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn test_issue_and_verify() {
        let keys = SessionKeys::new(SECRET, 60);
        let token = keys.issue(&sample_user(7, Role::Caixa)).unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.username, "user7");
        assert_eq!(claims.role, "caixa");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let token = SessionKeys::new("another-secret-another-secret-xx", 60)
            .issue(&sample_user(1, Role::Admin))
            .unwrap();
        let result = SessionKeys::new(SECRET, 60).verify(&token);
        assert!(matches!(result, Err(Error::Session(_))));
    }

    #[test]
    fn test_cookie_value() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; caixa_session=abc.def; caixa_flash=xyz"),
        );
        assert_eq!(cookie_value(&headers, SESSION_COOKIE), Some("abc.def"));
        assert_eq!(cookie_value(&headers, "caixa_flash"), Some("xyz"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }
}
