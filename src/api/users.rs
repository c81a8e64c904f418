//! User session endpoints (JSON)

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::AppResult,
    models::{
        user::{LoginRequest, RegisterRequest},
        User,
    },
    AppState,
};

use super::{SessionContext, ValidatedJson};

/// Sign in with email and password; sets the session cookie
#[utoipa::path(
    post,
    path = "/user/login",
    tag = "user",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = User),
        (status = 400, description = "Invalid credentials or fields", body = crate::error::ErrorResponse),
        (status = 502, description = "Auth service unavailable", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    session: SessionContext,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> AppResult<Json<User>> {
    let user = session
        .auth_client(&state)
        .sign_in_with_password(&request.email, &request.password)
        .await?;
    Ok(Json(user))
}

/// Create an account; signs in immediately when the backend issues a session
#[utoipa::path(
    post,
    path = "/user/register",
    tag = "user",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created", body = User),
        (status = 400, description = "Rejected registration or invalid fields", body = crate::error::ErrorResponse),
        (status = 502, description = "Auth service unavailable", body = crate::error::ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    session: SessionContext,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> AppResult<Json<User>> {
    let user = session
        .auth_client(&state)
        .sign_up(&request.email, &request.password)
        .await?;
    Ok(Json(user))
}

/// Sign out; removes the session cookie
#[utoipa::path(
    post,
    path = "/user/logout",
    tag = "user",
    responses(
        (status = 204, description = "Signed out")
    )
)]
pub async fn logout(State(state): State<AppState>, session: SessionContext) -> StatusCode {
    session.auth_client(&state).sign_out().await;
    StatusCode::NO_CONTENT
}
