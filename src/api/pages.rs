//! Server-rendered pages: landing, auth forms and the protected dashboard

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::request::Parts,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        user::{LoginRequest, RegisterRequest},
        BookQuery, User,
    },
    views, AppState,
};

use super::{SessionContext, ValidatedQuery};

/// Signed-in caller for a protected page.
///
/// Resolved before the page renders; anonymous callers (or a failing auth
/// backend) get a redirect to login and no page markup.
pub struct ProtectedPage {
    pub user: User,
    pub access_token: String,
}

impl ProtectedPage {
    /// Wrap page content in the signed-in shell
    pub fn render(&self, title: &str, content: &str) -> Html<String> {
        Html(views::protected_shell(title, &self.user.email, content))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for ProtectedPage {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let to_login = || Redirect::temporary(state.gate.login_path()).into_response();

        let session = SessionContext::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        if let Ok(caller) = session.require_user() {
            return Ok(ProtectedPage {
                user: caller.user,
                access_token: caller.access_token,
            });
        }

        // Not resolved upstream (path outside the protected prefixes)
        match session.auth_client(state).get_authenticated().await {
            Ok(Some(auth)) => Ok(ProtectedPage {
                user: auth.user,
                access_token: auth.session.access_token,
            }),
            Ok(None) => Err(to_login()),
            Err(e) => {
                tracing::warn!("Protected page auth check failed: {}", e);
                Err(to_login())
            }
        }
    }
}

/// First field message of a validation failure, for inline form errors
fn form_error(error: AppError) -> String {
    match error {
        AppError::InvalidFields(fields) => fields
            .into_values()
            .flatten()
            .next()
            .unwrap_or_else(|| "Invalid input".to_string()),
        other => other.user_message(),
    }
}

pub async fn landing() -> Html<String> {
    Html(views::landing())
}

pub async fn login_page() -> Html<String> {
    Html(views::login_form(None, ""))
}

pub async fn login_submit(
    State(state): State<AppState>,
    session: SessionContext,
    Form(form): Form<LoginRequest>,
) -> Response {
    if let Err(errors) = form.validate() {
        let message = form_error(errors.into());
        return (
            axum::http::StatusCode::BAD_REQUEST,
            Html(views::login_form(Some(&message), &form.email)),
        )
            .into_response();
    }

    match session
        .auth_client(&state)
        .sign_in_with_password(&form.email, &form.password)
        .await
    {
        Ok(_) => Redirect::to(state.gate.dashboard_path()).into_response(),
        Err(e) => {
            let error = AppError::from(e);
            (
                error.status_code(),
                Html(views::login_form(Some(&error.user_message()), &form.email)),
            )
                .into_response()
        }
    }
}

pub async fn register_page() -> Html<String> {
    Html(views::register_form(None, ""))
}

pub async fn register_submit(
    State(state): State<AppState>,
    session: SessionContext,
    Form(form): Form<RegisterRequest>,
) -> Response {
    if let Err(errors) = form.validate() {
        let message = form_error(errors.into());
        return (
            axum::http::StatusCode::BAD_REQUEST,
            Html(views::register_form(Some(&message), &form.email)),
        )
            .into_response();
    }

    let client = session.auth_client(&state);
    match client.sign_up(&form.email, &form.password).await {
        Ok(_) => {
            // Without email confirmation the account is signed in already
            match client.get_session().await {
                Ok(Some(_)) => Redirect::to(state.gate.dashboard_path()).into_response(),
                _ => Html(views::login_form(
                    Some("Account created. Check your inbox to confirm your email, then sign in."),
                    &form.email,
                ))
                .into_response(),
            }
        }
        Err(e) => {
            let error = AppError::from(e);
            (
                error.status_code(),
                Html(views::register_form(Some(&error.user_message()), &form.email)),
            )
                .into_response()
        }
    }
}

pub async fn logout_submit(State(state): State<AppState>, session: SessionContext) -> Redirect {
    session.auth_client(&state).sign_out().await;
    Redirect::to(state.gate.login_path())
}

pub async fn dashboard(page: ProtectedPage) -> Html<String> {
    page.render("Dashboard", &views::dashboard_home())
}

pub async fn books_list(
    State(state): State<AppState>,
    page: ProtectedPage,
    query: Result<ValidatedQuery<BookQuery>, AppError>,
) -> Response {
    let query = match query {
        Ok(ValidatedQuery(query)) => query,
        Err(e) => {
            let status = e.status_code();
            let content = list_error(&form_error(e));
            return (status, page.render("Books", &content)).into_response();
        }
    };

    let content = match state.services.books.list(&page.access_token, &query).await {
        Ok(list) => views::book_table(&list, &query),
        Err(e) => list_error(&e.user_message()),
    };
    page.render("Books", &content).into_response()
}

fn list_error(message: &str) -> String {
    format!(
        r#"<h1>Books</h1><p class="error" role="alert">{}</p>"#,
        views::escape(message)
    )
}
