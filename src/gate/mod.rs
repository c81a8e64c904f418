//! Edge request gate.
//!
//! Runs before every routed request: resolves the session from cookies
//! (refreshing it when needed), then redirects or passes through according to
//! the path class. Cookie writes made here or by the handler are sent back on
//! the response.

pub mod paths;

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::{
    models::{AuthSession, User},
    services::cookies::SessionCookies,
    AppState,
};

pub use paths::{is_static_asset, GateDecision, GateRules, PathClass};

/// Session resolved by the gate, inserted as a request extension
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<AuthSession>);

impl CurrentUser {
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref().map(|auth| &auth.user)
    }

    pub fn access_token(&self) -> Option<&str> {
        self.0.as_ref().map(|auth| auth.session.access_token.as_str())
    }
}

pub async fn session_gate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    if is_static_asset(&path) {
        return next.run(request).await;
    }

    let cookies = Arc::new(SessionCookies::from_headers(request.headers()));
    let client = state.services.auth_client(cookies.clone());
    let auth = match client.get_authenticated().await {
        Ok(auth) => auth,
        Err(e) => {
            tracing::warn!(path = %path, "Session resolution failed, continuing as anonymous: {}", e);
            None
        }
    };

    // Handlers must see refreshed tokens, not the stale inbound ones
    if cookies.has_changes() {
        cookies.apply_to_request(request.headers_mut());
    }

    let class = state.gate.classify(&path);
    let mut response = match state.gate.decide(class, auth.is_some()) {
        GateDecision::Redirect(target) => {
            tracing::debug!(path = %path, ?class, target = %target, "Gate redirect");
            Redirect::temporary(&target).into_response()
        }
        GateDecision::PassThrough => {
            request.extensions_mut().insert(Arc::clone(&cookies));
            request.extensions_mut().insert(CurrentUser(auth));
            next.run(request).await
        }
    };

    cookies.apply_to_response(response.headers_mut());
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        middleware::from_fn_with_state,
        routing::get,
        Extension, Router,
    };
    use chrono::Utc;
    use tower::ServiceExt;

    use crate::{
        config::AppConfig,
        models::Session,
        repository::{auth::MockAuthBackend, books::MockBookStore, Repository},
        services::auth::{
            tests::{session, user, valid_session},
            AuthError,
        },
    };

    async fn whoami(Extension(current): Extension<CurrentUser>) -> String {
        current
            .user()
            .map(|u| u.email.clone())
            .unwrap_or_else(|| "anonymous".to_string())
    }

    fn app(backend: MockAuthBackend) -> (Router, String) {
        let state = AppState::new(
            AppConfig::default(),
            Repository::with_backends(Arc::new(backend), Arc::new(MockBookStore::new())),
        );
        let cookie_name = state.config.session_cookie_name();
        let router = Router::new()
            .route("/dashboard", get(whoami))
            .route("/dashboard/booksManagement/list", get(whoami))
            .route("/user/login", get(whoami))
            .route("/about", get(whoami))
            .route("/favicon.ico", get(|| async { "icon" }))
            .route("/_next/static/chunk.js", get(|| async { "chunk" }))
            .layer(from_fn_with_state(state.clone(), session_gate))
            .with_state(state);
        (router, cookie_name)
    }

    fn request(path: &str, cookie: Option<(&str, &Session)>) -> Request<Body> {
        let mut builder = Request::builder().uri(path);
        if let Some((name, session)) = cookie {
            builder = builder.header(header::COOKIE, format!("{}={}", name, session.to_cookie_value()));
        }
        builder.body(Body::empty()).unwrap()
    }

    fn location(response: &Response) -> Option<&str> {
        response.headers().get(header::LOCATION).and_then(|v| v.to_str().ok())
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn signed_in_backend() -> MockAuthBackend {
        let mut backend = MockAuthBackend::new();
        backend.expect_get_user().returning(|_| Ok(Some(user())));
        backend
    }

    #[tokio::test]
    async fn test_protected_without_session_redirects_to_login() {
        let (app, _) = app(MockAuthBackend::new());
        let response = app
            .oneshot(request("/dashboard/booksManagement/list", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), Some("/user/login"));
    }

    #[tokio::test]
    async fn test_protected_with_session_passes_through() {
        let (app, cookie) = app(signed_in_backend());
        let session = valid_session("access-1");
        let response = app
            .oneshot(request("/dashboard", Some((&cookie, &session))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "staff@library.test");
    }

    #[tokio::test]
    async fn test_auth_page_with_session_redirects_to_dashboard() {
        let (app, cookie) = app(signed_in_backend());
        let session = valid_session("access-1");
        let response = app
            .oneshot(request("/user/login", Some((&cookie, &session))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), Some("/dashboard"));
    }

    #[tokio::test]
    async fn test_auth_page_without_session_passes_through() {
        let (app, _) = app(MockAuthBackend::new());
        let response = app.oneshot(request("/user/login", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "anonymous");
    }

    #[tokio::test]
    async fn test_unclassified_path_always_passes() {
        let (app, cookie) = app(signed_in_backend());
        let session = valid_session("access-1");

        let anonymous = app.clone().oneshot(request("/about", None)).await.unwrap();
        assert_eq!(anonymous.status(), StatusCode::OK);

        let signed_in = app
            .oneshot(request("/about", Some((&cookie, &session))))
            .await
            .unwrap();
        assert_eq!(signed_in.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_static_assets_skip_session_resolution() {
        let mut backend = MockAuthBackend::new();
        backend.expect_get_user().never();
        backend.expect_refresh_session().never();
        let (app, cookie) = app(backend);
        let session = session("expired", 0);

        for path in ["/favicon.ico", "/_next/static/chunk.js"] {
            let response = app
                .clone()
                .oneshot(request(path, Some((&cookie, &session))))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert!(response.headers().get(header::SET_COOKIE).is_none());
        }
    }

    #[tokio::test]
    async fn test_decision_is_idempotent() {
        let (app, _) = app(MockAuthBackend::new());
        let first = app.clone().oneshot(request("/dashboard", None)).await.unwrap();
        let second = app.oneshot(request("/dashboard", None)).await.unwrap();

        assert_eq!(first.status(), second.status());
        assert_eq!(location(&first), location(&second));
    }

    #[tokio::test]
    async fn test_backend_failure_is_treated_as_anonymous() {
        let mut backend = MockAuthBackend::new();
        backend
            .expect_get_user()
            .returning(|_| Err(AuthError::Backend("connection reset".to_string())));
        let (app, cookie) = app(backend);
        let session = valid_session("access-1");

        let response = app
            .oneshot(request("/dashboard", Some((&cookie, &session))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), Some("/user/login"));
    }

    #[tokio::test]
    async fn test_refreshed_session_is_written_on_redirect() {
        let mut backend = MockAuthBackend::new();
        backend.expect_refresh_session().times(1).returning(|_| {
            Ok(Some(AuthSession {
                session: valid_session("fresh"),
                user: user(),
            }))
        });
        backend
            .expect_get_user()
            .withf(|token: &str| token == "fresh")
            .returning(|_| Ok(Some(user())));
        let (app, cookie) = app(backend);
        let stale = session("stale", Utc::now().timestamp() + 5);

        let response = app
            .oneshot(request("/user/login", Some((&cookie, &stale))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(set_cookie.starts_with(&format!("{}=base64-", cookie)));
        assert!(set_cookie.contains("HttpOnly"));
    }

    #[tokio::test]
    async fn test_rejected_refresh_clears_cookie_and_redirects() {
        let mut backend = MockAuthBackend::new();
        backend.expect_refresh_session().returning(|_| Ok(None));
        let (app, cookie) = app(backend);
        let expired = session("old", 0);

        let response = app
            .oneshot(request("/dashboard", Some((&cookie, &expired))))
            .await
            .unwrap();

        assert_eq!(location(&response), Some("/user/login"));
        let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(set_cookie.contains("Max-Age=0"));
    }
}
