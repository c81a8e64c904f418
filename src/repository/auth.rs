//! Transport to the hosted identity service (GoTrue HTTP API)

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;

use crate::{
    config::BackendConfig,
    models::{AuthSession, Session, User},
    services::auth::AuthError,
};

/// Result of a sign-up: a session is only issued when the account is
/// usable immediately (email confirmation disabled)
#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    pub user: User,
    pub session: Option<Session>,
}

/// Raw operations of the identity service.
///
/// "No session" outcomes (token rejected, refresh token revoked) are
/// `Ok(None)`; `Err(AuthError::Backend)` is reserved for transport and
/// server failures.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Verify an access token and return its user
    async fn get_user(&self, access_token: &str) -> Result<Option<User>, AuthError>;

    /// Exchange a refresh token for a new session
    async fn refresh_session(&self, refresh_token: &str) -> Result<Option<AuthSession>, AuthError>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, AuthError>;

    /// Revoke the session owning `access_token`
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;

    /// Reachability probe
    async fn health(&self) -> Result<(), AuthError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: User,
}

impl From<TokenResponse> for AuthSession {
    fn from(token: TokenResponse) -> Self {
        let expires_at = token
            .expires_at
            .unwrap_or_else(|| Utc::now().timestamp() + token.expires_in.unwrap_or(3600));
        AuthSession {
            session: Session {
                access_token: token.access_token,
                refresh_token: token.refresh_token,
                expires_at,
                token_type: token.token_type.unwrap_or_else(|| "bearer".to_string()),
            },
            user: token.user,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error_code: Option<String>,
    error: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
}

/// Map an identity-service error response onto an [`AuthError`] kind
pub fn classify_error(status: StatusCode, body: &str) -> AuthError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .msg
        .or(parsed.error_description)
        .or(parsed.message)
        .unwrap_or_else(|| status.to_string());

    if status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
    {
        return AuthError::Backend(format!("{}: {}", status, message));
    }

    let code = parsed.error_code.or(parsed.error).unwrap_or_default();
    let lower = message.to_lowercase();
    match code.as_str() {
        "invalid_credentials" => AuthError::InvalidCredentials,
        "email_not_confirmed" => AuthError::EmailNotConfirmed,
        "user_already_exists" | "email_exists" => AuthError::AlreadyRegistered,
        "weak_password" => AuthError::WeakPassword(message),
        "email_address_invalid" | "email_address_not_authorized" => AuthError::InvalidEmail,
        _ if lower.contains("invalid login credentials") => AuthError::InvalidCredentials,
        _ if lower.contains("email not confirmed") => AuthError::EmailNotConfirmed,
        _ if lower.contains("already registered") => AuthError::AlreadyRegistered,
        _ if lower.contains("password should") => AuthError::WeakPassword(message),
        _ if lower.contains("validate email") => AuthError::InvalidEmail,
        _ => AuthError::Rejected {
            code: if code.is_empty() {
                status.as_u16().to_string()
            } else {
                code
            },
            message,
        },
    }
}

/// Statuses meaning the presented token is dead (bad JWT, revoked or
/// unknown refresh token); anything else leaves the session in place
pub fn is_session_rejection(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
    )
}

fn transport(e: reqwest::Error) -> AuthError {
    AuthError::Backend(e.to_string())
}

/// GoTrue client over a shared `reqwest` connection pool
#[derive(Clone)]
pub struct GoTrueBackend {
    http: Client,
    base_url: String,
    anon_key: String,
}

impl GoTrueBackend {
    pub fn new(http: Client, config: &BackendConfig) -> Self {
        Self {
            http,
            base_url: format!("{}/auth/v1", config.url.trim_end_matches('/')),
            anon_key: config.anon_key.clone(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .header("apikey", &self.anon_key)
    }

    async fn error_from(response: Response) -> AuthError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        classify_error(status, &body)
    }
}

#[async_trait]
impl AuthBackend for GoTrueBackend {
    async fn get_user(&self, access_token: &str) -> Result<Option<User>, AuthError> {
        let response = self
            .request(reqwest::Method::GET, "/user")
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if status.is_success() {
            return response.json::<User>().await.map(Some).map_err(transport);
        }
        if is_session_rejection(status) {
            tracing::debug!("Access token rejected: {}", status);
            return Ok(None);
        }
        Err(Self::error_from(response).await)
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Option<AuthSession>, AuthError> {
        let response = self
            .request(reqwest::Method::POST, "/token?grant_type=refresh_token")
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if status.is_success() {
            let token = response.json::<TokenResponse>().await.map_err(transport)?;
            return Ok(Some(token.into()));
        }
        if is_session_rejection(status) {
            tracing::debug!("Refresh token rejected: {}", status);
            return Ok(None);
        }
        Err(Self::error_from(response).await)
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let response = self
            .request(reqwest::Method::POST, "/token?grant_type=password")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        let token = response.json::<TokenResponse>().await.map_err(transport)?;
        Ok(token.into())
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, AuthError> {
        let response = self
            .request(reqwest::Method::POST, "/signup")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        // A session comes back only when the account is confirmed already;
        // otherwise the body is the bare user
        let body: serde_json::Value = response.json().await.map_err(transport)?;
        if body.get("access_token").is_some() {
            let token: TokenResponse = serde_json::from_value(body)
                .map_err(|e| AuthError::Backend(format!("Unexpected sign-up response: {}", e)))?;
            let auth: AuthSession = token.into();
            return Ok(SignUpOutcome {
                user: auth.user,
                session: Some(auth.session),
            });
        }

        let user: User = serde_json::from_value(body)
            .map_err(|e| AuthError::Backend(format!("Unexpected sign-up response: {}", e)))?;
        Ok(SignUpOutcome { user, session: None })
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let response = self
            .request(reqwest::Method::POST, "/logout?scope=local")
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        // Unknown or already revoked sessions count as signed out
        if status.is_success() || status.is_client_error() {
            return Ok(());
        }
        Err(Self::error_from(response).await)
    }

    async fn health(&self) -> Result<(), AuthError> {
        let response = self
            .request(reqwest::Method::GET, "/health")
            .send()
            .await
            .map_err(transport)?;

        if response.status().is_success() {
            return Ok(());
        }
        Err(AuthError::Backend(format!("Health probe returned {}", response.status())))
    }
}
