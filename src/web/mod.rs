//! HTTP front end: router, sessions, flash messages and pages.

pub mod error;
pub mod flash;
pub mod handlers;
pub mod session;
pub mod views;

use crate::{config::AppConfig, errors::Result};
use axum::{
    Router,
    routing::{get, post},
};
use handlers::{auth, ledger, registers, reports, users};
use sea_orm::DatabaseConnection;
use session::SessionKeys;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use views::Views;

/// Shared state of every request.
#[derive(Clone)]
pub struct AppState {
    /// Connection pool, shared behind an `Arc` since the connection itself is not always `Clone`
    pub db: Arc<DatabaseConnection>,
    /// Settings loaded at startup
    pub config: Arc<AppConfig>,
    /// Keys used to sign and verify session cookies
    pub sessions: Arc<SessionKeys>,
    /// Template environment
    pub views: Arc<Views>,
}

impl AppState {
    /// Builds the state, compiling the templates and deriving the session keys.
    pub fn new(db: DatabaseConnection, config: AppConfig) -> Result<Self> {
        let sessions = SessionKeys::new(&config.session.secret, config.session.lifetime_minutes);
        Ok(Self {
            db: Arc::new(db),
            config: Arc::new(config),
            sessions: Arc::new(sessions),
            views: Arc::new(Views::new()?),
        })
    }
}

/// Every route of the application.
pub fn router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/admin/registers/{id}/delete", post(registers::delete_register))
        .route("/admin/users", get(users::list_users).post(users::create_user))
        .route("/admin/users/{id}/reset", post(users::reset_password))
        .route("/admin/users/{id}/delete", post(users::delete_user))
        .route("/admin/ledger", get(ledger::ledger_page).post(ledger::save_entry))
        .route("/admin/ledger/{id}/delete", post(ledger::delete_entry))
        .route("/admin/report", get(reports::period_report));

    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/", get(registers::index))
        .route("/opening", get(registers::opening_page).post(registers::open_register))
        .route(
            "/closing/{id}",
            get(registers::closing_page).post(registers::close_register),
        )
        .route("/summary/{id}", get(registers::summary))
        .route("/history", get(registers::history))
        .merge(admin)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the application until Ctrl+C.
pub async fn serve(state: AppState) -> Result<()> {
    let bind_addr = state.config.server.bind_addr.clone();
    let listener = TcpListener::bind(&bind_addr).await?;
    info!(%bind_addr, "HTTP server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl+C");
    }
    info!("Shutdown requested");
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entities::Role;
    use crate::test_utils::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
        response::Response,
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn test_state() -> AppState {
        let db = setup_test_db().await.unwrap();
        let mut config = AppConfig::default();
        config.session.secret = "0123456789abcdef0123456789abcdef".to_string();
        AppState::new(db, config).unwrap()
    }

    async fn send(state: &AppState, request: Request<Body>) -> Response {
        router(state.clone()).oneshot(request).await.unwrap()
    }

    fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn post_form(uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn location(response: &Response) -> &str {
        response.headers()[header::LOCATION].to_str().unwrap()
    }

    /// `name=value` of the session cookie set by a login response.
    fn session_cookie(response: &Response) -> String {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with(session::SESSION_COOKIE))
            .and_then(|v| v.split(';').next())
            .unwrap()
            .to_string()
    }

    async fn login_as(state: &AppState, username: &str, role: Role) -> String {
        create_test_user(&*state.db, username, role).await.unwrap();
        let response = send(
            state,
            post_form(
                "/login",
                None,
                &format!("username={username}&password={TEST_PASSWORD}"),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
        session_cookie(&response)
    }

    async fn body_text(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_cloned_state_shares_database() {
        let state = test_state().await;
        let cloned = state.clone();
        assert!(Arc::ptr_eq(&state.db, &cloned.db));

        create_test_user(&cloned.db, "joana", Role::User).await.unwrap();
        let found = crate::core::user::get_user_by_username(&state.db, "joana")
            .await
            .unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_anonymous_is_sent_to_login() {
        let state = test_state().await;
        for uri in ["/", "/history", "/opening", "/admin/report"] {
            let response = send(&state, get(uri, None)).await;
            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
            assert_eq!(location(&response), "/login", "{uri}");
        }

        let page = send(&state, get("/login", None)).await;
        assert_eq!(page.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_wrong_password_stays_on_login() {
        let state = test_state().await;
        create_test_user(&*state.db, "maria", Role::Caixa).await.unwrap();

        let response = send(
            &state,
            post_form("/login", None, "username=maria&password=errada"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");
    }

    #[tokio::test]
    async fn test_login_flow() {
        let state = test_state().await;
        let cookie = login_as(&state, "maria", Role::Caixa).await;

        let home = send(&state, get("/", Some(&cookie))).await;
        assert_eq!(home.status(), StatusCode::OK);
        assert!(body_text(home).await.contains("maria"));

        let logout = send(&state, get("/logout", Some(&cookie))).await;
        assert_eq!(location(&logout), "/login");
    }

    #[tokio::test]
    async fn test_admin_pages_reject_regular_users() {
        let state = test_state().await;
        let cookie = login_as(&state, "maria", Role::Caixa).await;

        for uri in ["/admin/users", "/admin/ledger", "/admin/report"] {
            let response = send(&state, get(uri, Some(&cookie))).await;
            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
            assert_eq!(location(&response), "/", "{uri}");
        }
    }

    #[tokio::test]
    async fn test_admin_pages_render_for_admin() {
        let state = test_state().await;
        let cookie = login_as(&state, "admin", Role::Admin).await;

        for uri in [
            "/admin/users",
            "/admin/ledger",
            "/admin/report?start=2024-03-04&end=2024-03-10",
            "/history",
        ] {
            let response = send(&state, get(uri, Some(&cookie))).await;
            assert_eq!(response.status(), StatusCode::OK, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_ledger_page_limits_long_periods() {
        let state = test_state().await;
        let cookie = login_as(&state, "admin", Role::Admin).await;

        let response = send(
            &state,
            get("/admin/ledger?start=0001-01-01&end=9999-12-31", Some(&cookie)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains(r#"name="end" value="0001-02-01""#));
        assert!(!body.contains("9999-12-31"));
    }

    #[tokio::test]
    async fn test_deleted_user_loses_session() {
        let state = test_state().await;
        let cookie = login_as(&state, "maria", Role::Caixa).await;
        let admin = create_test_user(&*state.db, "admin", Role::Admin).await.unwrap();
        let maria = crate::core::user::get_user_by_username(&*state.db, "maria")
            .await
            .unwrap()
            .unwrap();
        crate::core::user::delete_user(&*state.db, admin.id, maria.id)
            .await
            .unwrap();

        let response = send(&state, get("/", Some(&cookie))).await;
        assert_eq!(location(&response), "/login");
    }

    #[tokio::test]
    async fn test_open_close_and_summary() {
        let state = test_state().await;
        let cookie = login_as(&state, "maria", Role::Caixa).await;

        let opened = send(
            &state,
            post_form("/opening", Some(&cookie), "date=2024-03-08&v_50=100&v_0_25=1"),
        )
        .await;
        assert_eq!(opened.status(), StatusCode::SEE_OTHER);
        let closing_uri = location(&opened).to_string();
        assert!(closing_uri.starts_with("/closing/"));

        // A second opening goes back to the open register
        let again = send(&state, post_form("/opening", Some(&cookie), "date=2024-03-08")).await;
        assert_eq!(location(&again), closing_uri);

        let form = send(&state, get(&closing_uri, Some(&cookie))).await;
        assert_eq!(form.status(), StatusCode::OK);

        let payload = r#"{"closing_cash": 151.0, "mp_debit": 120.0,
            "withdrawals": [{"description": "Gás", "amount": 50.0, "payment_method": "Dinheiro"}]}"#;
        let closed = send(
            &state,
            Request::builder()
                .method("POST")
                .uri(&closing_uri)
                .header(header::COOKIE, &cookie)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload))
                .unwrap(),
        )
        .await;
        assert_eq!(closed.status(), StatusCode::OK);
        let reply: serde_json::Value = serde_json::from_str(&body_text(closed).await).unwrap();
        assert_eq!(reply["ok"], true);
        let summary_uri = reply["redirect"].as_str().unwrap().to_string();

        let summary = send(&state, get(&summary_uri, Some(&cookie))).await;
        assert_eq!(summary.status(), StatusCode::OK);
        // 120 in cards plus 100 cash sales: 50 counted over the opening and 50 withdrawn
        assert!(body_text(summary).await.contains("R$ 220,00"));
    }
}
