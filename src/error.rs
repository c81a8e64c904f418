//! Error types for Bookshelf server

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::services::auth::AuthError;

/// Per-field validation messages, keyed by field name
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Application error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    NotAuthorized = 2,
    BackendFailure = 3,
    NoSuchBook = 5,
    Duplicate = 8,
    BadValue = 18,
    InvalidCredentials = 30,
    EmailNotConfirmed = 31,
    AlreadyRegistered = 32,
    WeakPassword = 33,
    InvalidEmail = 34,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid fields")]
    InvalidFields(FieldErrors),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Remote table error: {0}")]
    Remote(#[from] reqwest::Error),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldErrors>,
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        for (field, errs) in errors.field_errors() {
            let messages = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            fields.insert(field.to_string(), messages);
        }
        AppError::InvalidFields(fields)
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, ErrorCode, String) {
        match self {
            AppError::Authentication(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorCode::NoSuchBook, msg.clone()),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone())
            }
            AppError::InvalidFields(_) => (
                StatusCode::BAD_REQUEST,
                ErrorCode::BadValue,
                "Request validation failed".to_string(),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, ErrorCode::Duplicate, msg.clone()),
            AppError::Auth(e) => {
                let code = match e {
                    AuthError::InvalidCredentials => ErrorCode::InvalidCredentials,
                    AuthError::EmailNotConfirmed => ErrorCode::EmailNotConfirmed,
                    AuthError::AlreadyRegistered => ErrorCode::AlreadyRegistered,
                    AuthError::WeakPassword(_) => ErrorCode::WeakPassword,
                    AuthError::InvalidEmail => ErrorCode::InvalidEmail,
                    AuthError::Rejected { .. } => ErrorCode::Failure,
                    AuthError::Backend(msg) => {
                        tracing::error!("Auth backend error: {}", msg);
                        return (
                            StatusCode::BAD_GATEWAY,
                            ErrorCode::BackendFailure,
                            "Authentication service unavailable, please retry".to_string(),
                        );
                    }
                };
                (StatusCode::BAD_REQUEST, code, e.to_string())
            }
            AppError::Remote(e) => {
                tracing::error!("Remote table error: {:?}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    ErrorCode::BackendFailure,
                    "Database service unavailable, please retry".to_string(),
                )
            }
            AppError::Backend(msg) => {
                tracing::error!("Backend error: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    ErrorCode::BackendFailure,
                    "Database service unavailable, please retry".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                )
            }
        }
    }

    /// Message safe to show to the end user
    pub fn user_message(&self) -> String {
        self.parts().2
    }

    pub fn status_code(&self) -> StatusCode {
        self.parts().0
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        let fields = match self {
            AppError::InvalidFields(fields) => Some(fields),
            _ => None,
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
            fields,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
