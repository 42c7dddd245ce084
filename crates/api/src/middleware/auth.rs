//! Authentication extractors.
//!
//! Handlers take `RequireAuth` (any logged-in user) or `RequireAdmin`
//! (admin flag set) as arguments. The access token is read from the
//! `Authorization: Bearer` header first, then from the `access_token`
//! cookie set at login.

use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;

use orchard_core::UserId;

use crate::db::UserRepository;
use crate::error::AppError;
use crate::models::User;
use crate::services::auth::TokenKind;
use crate::state::AppState;

/// Cookie carrying the access token.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Cookie carrying the refresh token.
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// Extractor that requires a logged-in user.
pub struct RequireAuth(pub User);

/// Extractor that requires a logged-in admin user.
pub struct RequireAdmin(pub User);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticate(parts, state).await?;
        Ok(Self(user))
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticate(parts, state).await?;
        if !user.is_admin {
            return Err(AppError::Forbidden);
        }
        Ok(Self(user))
    }
}

async fn authenticate(parts: &Parts, state: &AppState) -> Result<User, AppError> {
    let token = access_token(parts)
        .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_owned()))?;

    let user_id = state
        .tokens()
        .verify(&token, TokenKind::Access)
        .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_owned()))?;

    load_user(state, user_id).await
}

/// Look up the token's user; a valid token for a deleted account is rejected.
async fn load_user(state: &AppState, user_id: UserId) -> Result<User, AppError> {
    UserRepository::new(state.pool())
        .get_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Unknown user".to_owned()))
}

fn access_token(parts: &Parts) -> Option<String> {
    if let Some(token) = bearer_token(parts) {
        return Some(token);
    }

    parts
        .headers
        .get(COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|header| cookie_value(header, ACCESS_TOKEN_COOKIE))
        .map(ToOwned::to_owned)
}

fn bearer_token(parts: &Parts) -> Option<String> {
    let header = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?;
    Some(token.to_owned())
}

/// Find a cookie's value in a `Cookie` header.
pub fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then_some(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_value_single() {
        assert_eq!(cookie_value("access_token=abc123", "access_token"), Some("abc123"));
    }

    #[test]
    fn test_cookie_value_among_others() {
        let header = "theme=dark; access_token=abc.def.ghi; refresh_token=xyz";
        assert_eq!(cookie_value(header, "access_token"), Some("abc.def.ghi"));
        assert_eq!(cookie_value(header, "refresh_token"), Some("xyz"));
    }

    #[test]
    fn test_cookie_value_missing() {
        assert_eq!(cookie_value("theme=dark", "access_token"), None);
        assert_eq!(cookie_value("", "access_token"), None);
    }

    #[test]
    fn test_cookie_name_is_exact_match() {
        // A suffix of another cookie name must not match.
        assert_eq!(cookie_value("xaccess_token=evil", "access_token"), None);
    }
}
