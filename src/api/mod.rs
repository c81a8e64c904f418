//! API handlers and HTML pages for Bookshelf

pub mod books;
pub mod health;
pub mod openapi;
pub mod pages;
pub mod users;

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    gate::CurrentUser,
    models::User,
    services::{auth::AuthClient, cookies::SessionCookies},
    AppState,
};

/// Per-request cookie store and resolved session, as installed by the gate.
///
/// Never rejects for an anonymous caller; handlers call
/// [`SessionContext::require_user`] after their input has been validated.
pub struct SessionContext {
    pub cookies: Arc<SessionCookies>,
    pub current: CurrentUser,
}

/// Signed-in caller with the token used for row-level access
pub struct AuthenticatedUser {
    pub user: User,
    pub access_token: String,
}

impl SessionContext {
    /// Auth client writing through this request's cookie store
    pub fn auth_client(&self, state: &AppState) -> AuthClient {
        state.services.auth_client(self.cookies.clone())
    }

    pub fn require_user(&self) -> AppResult<AuthenticatedUser> {
        let auth = self
            .current
            .0
            .as_ref()
            .ok_or_else(|| AppError::Authentication("Sign in required".to_string()))?;
        Ok(AuthenticatedUser {
            user: auth.user.clone(),
            access_token: auth.session.access_token.clone(),
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let cookies = parts
            .extensions
            .get::<Arc<SessionCookies>>()
            .cloned()
            .ok_or_else(|| AppError::Internal("Session gate is not installed".to_string()))?;
        let current = parts.extensions.get::<CurrentUser>().cloned().unwrap_or_default();

        Ok(SessionContext { cookies, current })
    }
}

/// JSON body validated before the handler runs
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

/// Query string validated before the handler runs
pub struct ValidatedQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        value.validate()?;
        Ok(ValidatedQuery(value))
    }
}
