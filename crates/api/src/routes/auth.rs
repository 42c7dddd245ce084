//! Authentication route handlers.
//!
//! Tokens travel as httponly cookies so the browser never exposes them to
//! scripts; API clients may instead send the access token as a bearer
//! header.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::HeaderMap;
use axum::response::{AppendHeaders, IntoResponse};
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, Result};
use crate::middleware::auth::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE, cookie_value};
use crate::middleware::RequireAuth;
use crate::models::User;
use crate::services::auth::{AuthService, TokenKind};
use crate::state::AppState;

const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Deserialize)]
pub struct RegisterPayload {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

/// Build a Set-Cookie value for an auth token.
fn auth_cookie(name: &str, value: &str, max_age_secs: i64) -> String {
    format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}")
}

/// Expire an auth cookie immediately.
fn clear_cookie(name: &str) -> String {
    auth_cookie(name, "", 0)
}

fn token_cookies(state: &AppState, user: &User) -> Result<[(axum::http::HeaderName, String); 2]> {
    let tokens = state.tokens();
    let access = tokens.issue(user.id, TokenKind::Access)?;
    let refresh = tokens.issue(user.id, TokenKind::Refresh)?;

    Ok([
        (
            SET_COOKIE,
            auth_cookie(ACCESS_TOKEN_COOKIE, &access, tokens.access_ttl().num_seconds()),
        ),
        (
            SET_COOKIE,
            auth_cookie(REFRESH_TOKEN_COOKIE, &refresh, tokens.refresh_ttl().num_seconds()),
        ),
    ])
}

/// POST /auth/register - Create an account and start a session.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<impl IntoResponse> {
    if payload.password.len() < MIN_PASSWORD_LENGTH {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if payload.first_name.trim().is_empty() || payload.last_name.trim().is_empty() {
        return Err(AppError::BadRequest("Name is required".to_owned()));
    }

    let user = AuthService::new(state.pool())
        .register(
            &payload.email,
            &payload.password,
            payload.first_name.trim(),
            payload.last_name.trim(),
        )
        .await?;

    let cookies = token_cookies(&state, &user)?;
    Ok((StatusCode::CREATED, AppendHeaders(cookies), Json(user)))
}

/// POST /auth/login - Verify credentials and start a session.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse> {
    let user = AuthService::new(state.pool())
        .login(&payload.email, &payload.password)
        .await?;

    let cookies = token_cookies(&state, &user)?;
    Ok((AppendHeaders(cookies), Json(user)))
}

/// POST /auth/logout - Expire both token cookies.
pub async fn logout() -> impl IntoResponse {
    let cookies = [
        (SET_COOKIE, clear_cookie(ACCESS_TOKEN_COOKIE)),
        (SET_COOKIE, clear_cookie(REFRESH_TOKEN_COOKIE)),
    ];
    (AppendHeaders(cookies), Json(json!({ "message": "Logged out" })))
}

/// POST /auth/refresh - Exchange a valid refresh cookie for a new access token.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    let refresh_token = headers
        .get(COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|header| cookie_value(header, REFRESH_TOKEN_COOKIE))
        .ok_or_else(|| AppError::Unauthorized("Missing refresh token".to_owned()))?;

    let user_id = state
        .tokens()
        .verify(refresh_token, TokenKind::Refresh)
        .map_err(|_| AppError::Unauthorized("Invalid or expired refresh token".to_owned()))?;

    // Reject refresh tokens for accounts that no longer exist
    let user = crate::db::UserRepository::new(state.pool())
        .get_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Unknown user".to_owned()))?;

    let tokens = state.tokens();
    let access = tokens.issue(user.id, TokenKind::Access)?;
    let cookies = [(
        SET_COOKIE,
        auth_cookie(ACCESS_TOKEN_COOKIE, &access, tokens.access_ttl().num_seconds()),
    )];

    Ok((AppendHeaders(cookies), Json(user)))
}

/// GET /auth/me - The authenticated user.
pub async fn me(RequireAuth(user): RequireAuth) -> Json<User> {
    Json(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_cookie_attributes() {
        let cookie = auth_cookie("access_token", "abc.def.ghi", 1800);
        assert_eq!(
            cookie,
            "access_token=abc.def.ghi; Path=/; HttpOnly; SameSite=Lax; Max-Age=1800"
        );
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let cookie = clear_cookie("refresh_token");
        assert!(cookie.starts_with("refresh_token=;"));
        assert!(cookie.ends_with("Max-Age=0"));
    }
}
