//! Remote auth client: session-aware wrapper over the identity service.
//!
//! One client is built per request scope (server) or per process (client
//! state). The session lives only in the cookie store; the client itself
//! keeps no session data.

use std::sync::Arc;

use thiserror::Error;

use crate::{
    config::AppConfig,
    models::{AuthEvent, AuthSession, Session, User},
    repository::auth::AuthBackend,
    services::{
        auth_events::{AuthEvents, Subscription},
        cookies::{CookieOptions, CookieStore, CookieToSet},
    },
};

/// Failure kinds reported by the identity service
#[derive(Error, Debug, Clone)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email address has not been confirmed")]
    EmailNotConfirmed,

    #[error("An account with this email already exists")]
    AlreadyRegistered,

    #[error("Password is too weak: {0}")]
    WeakPassword(String),

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("{message}")]
    Rejected { code: String, message: String },

    #[error("Auth service failure: {0}")]
    Backend(String),
}

impl AuthError {
    /// Transport or server-side failure, as opposed to a rejected request
    pub fn is_backend_failure(&self) -> bool {
        matches!(self, AuthError::Backend(_))
    }
}

/// Cookie and refresh settings shared by every client
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub cookie_name: String,
    pub cookie_options: CookieOptions,
    pub refresh_margin_secs: i64,
    pub allowed_email_domains: Vec<String>,
}

impl SessionSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            cookie_name: config.session_cookie_name(),
            cookie_options: CookieOptions::session(config.auth.cookie_secure),
            refresh_margin_secs: config.auth.refresh_margin_secs,
            allowed_email_domains: config
                .auth
                .allowed_email_domains
                .iter()
                .map(|d| d.to_lowercase())
                .collect(),
        }
    }

    fn email_domain_allowed(&self, email: &str) -> bool {
        if self.allowed_email_domains.is_empty() {
            return true;
        }
        email
            .rsplit_once('@')
            .map(|(_, domain)| domain.to_lowercase())
            .map_or(false, |domain| self.allowed_email_domains.contains(&domain))
    }
}

pub struct AuthClient {
    backend: Arc<dyn AuthBackend>,
    cookies: Arc<dyn CookieStore>,
    events: AuthEvents,
    settings: Arc<SessionSettings>,
}

impl AuthClient {
    pub fn new(
        backend: Arc<dyn AuthBackend>,
        cookies: Arc<dyn CookieStore>,
        settings: Arc<SessionSettings>,
    ) -> Self {
        Self {
            backend,
            cookies,
            events: AuthEvents::new(),
            settings,
        }
    }

    fn load_session(&self) -> Option<Session> {
        let entry = self
            .cookies
            .get_all()
            .into_iter()
            .find(|c| c.name == self.settings.cookie_name)?;
        let session = Session::from_cookie_value(&entry.value);
        if session.is_none() {
            tracing::debug!("Ignoring malformed session cookie");
        }
        session
    }

    fn store_session(&self, session: &Session) {
        self.cookies.set_all(vec![CookieToSet::new(
            self.settings.cookie_name.clone(),
            session.to_cookie_value(),
            self.settings.cookie_options.clone(),
        )]);
    }

    fn clear_session(&self) {
        self.cookies.set_all(vec![CookieToSet::removal(
            self.settings.cookie_name.clone(),
            self.settings.cookie_options.clone(),
        )]);
    }

    /// Session from the cookie store, refreshed when close to expiry.
    /// A rejected refresh clears the cookie and yields `None`.
    pub async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        let Some(session) = self.load_session() else {
            return Ok(None);
        };
        if !session.is_expired(self.settings.refresh_margin_secs) {
            return Ok(Some(session));
        }

        tracing::debug!("Access token expiring, refreshing session");
        match self.backend.refresh_session(&session.refresh_token).await? {
            Some(refreshed) => {
                self.store_session(&refreshed.session);
                Ok(Some(refreshed.session))
            }
            None => {
                tracing::info!("Session refresh rejected, clearing session cookie");
                self.clear_session();
                Ok(None)
            }
        }
    }

    /// Verified session and user, or `None` when anonymous
    pub async fn get_authenticated(&self) -> Result<Option<AuthSession>, AuthError> {
        let Some(session) = self.get_session().await? else {
            return Ok(None);
        };
        let user = self.backend.get_user(&session.access_token).await?;
        Ok(user.map(|user| AuthSession { session, user }))
    }

    /// Current user; `Ok(None)` means anonymous, never an error
    pub async fn get_current_user(&self) -> Result<Option<User>, AuthError> {
        Ok(self.get_authenticated().await?.map(|auth| auth.user))
    }

    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let auth = self.backend.sign_in_with_password(email, password).await?;
        self.store_session(&auth.session);
        tracing::info!(user_id = %auth.user.id, "User signed in");
        self.events.emit(&AuthEvent::SignedIn(auth.user.clone()));
        Ok(auth.user)
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<User, AuthError> {
        if !self.settings.email_domain_allowed(email) {
            return Err(AuthError::InvalidEmail);
        }

        let outcome = self.backend.sign_up(email, password).await?;
        tracing::info!(user_id = %outcome.user.id, "User registered");
        if let Some(ref session) = outcome.session {
            self.store_session(session);
            self.events.emit(&AuthEvent::SignedIn(outcome.user.clone()));
        }
        Ok(outcome.user)
    }

    /// Revoke the session and remove the cookie. A failed revocation is
    /// logged; the local session is cleared regardless.
    pub async fn sign_out(&self) {
        if let Some(session) = self.load_session() {
            if let Err(e) = self.backend.sign_out(&session.access_token).await {
                tracing::warn!("Session revocation failed: {}", e);
            }
        }
        self.clear_session();
        self.events.emit(&AuthEvent::SignedOut);
    }

    /// Listen for sign-in/sign-out transitions made through this client
    pub fn on_auth_state_change<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&AuthEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(handler)
    }
}
