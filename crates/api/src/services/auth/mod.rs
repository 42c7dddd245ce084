//! Customer authentication service.
//!
//! Password credentials hashed with Argon2id, session tokens as short-lived
//! JWT pairs: an access token for requests and a refresh token for minting
//! new pairs. Both carry a `type` claim so one can never stand in for the
//! other.

mod error;

pub use error::AuthError;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use orchard_core::{Email, UserId};

use crate::db::{RepositoryError, UserRepository};
use crate::models::User;

/// Which role a token plays in the session pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

#[derive(Serialize, Deserialize)]
struct Claims {
    /// User ID.
    sub: i32,
    /// Token kind, `access` or `refresh`.
    #[serde(rename = "type")]
    kind: String,
    iat: i64,
    exp: i64,
}

/// Issues and verifies the JWT session token pair.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    /// Create a token service from the signing secret and configured TTLs.
    #[must_use]
    pub fn new(secret: &SecretString, access_ttl_minutes: i64, refresh_ttl_days: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.expose_secret().as_bytes()),
            decoding: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            access_ttl: Duration::minutes(access_ttl_minutes),
            refresh_ttl: Duration::days(refresh_ttl_days),
        }
    }

    /// Lifetime of access tokens.
    #[must_use]
    pub const fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Lifetime of refresh tokens.
    #[must_use]
    pub const fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Sign a token of the given kind for a user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Token` if signing fails.
    pub fn issue(&self, user_id: UserId, kind: TokenKind) -> Result<String, AuthError> {
        let now = Utc::now();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };

        let claims = Claims {
            sub: user_id.as_i32(),
            kind: kind.as_str().to_owned(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.encoding)?;
        Ok(token)
    }

    /// Verify a token's signature, expiry, and kind, returning the user ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Token` if the token is malformed, mis-signed, or
    /// expired. Returns `AuthError::WrongTokenKind` if the `type` claim
    /// doesn't match `expected`.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<UserId, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)?;

        if data.claims.kind != expected.as_str() {
            return Err(AuthError::WrongTokenKind);
        }

        Ok(UserId::new(data.claims.sub))
    }
}

/// Hash a password with Argon2id and a fresh random salt.
///
/// # Errors
///
/// Returns `AuthError::Hash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Check a password against a stored PHC-format hash.
#[must_use]
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Customer authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email doesn't parse.
    /// Returns `AuthError::EmailTaken` if the email is already registered.
    /// Returns `AuthError::Hash` or `AuthError::Repository` on failure.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create(&email, &password_hash, first_name, last_name)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::EmailTaken,
                other => AuthError::Repository(other),
            })?;

        Ok(user)
    }

    /// Authenticate an email/password pair.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown email or wrong
    /// password; the two cases are not distinguished.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let Some((user, hash)) = self.users.get_with_password_hash(&email).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, &hash) {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn token_service() -> TokenService {
        TokenService::new(&SecretString::from("test-secret-0123456789abcdef"), 30, 7)
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &hash));
        assert!(!verify_password("wrong password", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same password").unwrap();
        let b = hash_password("same password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(!verify_password("anything", "not a phc string"));
    }

    #[test]
    fn test_token_roundtrip() {
        let tokens = token_service();
        let token = tokens.issue(UserId::new(42), TokenKind::Access).unwrap();
        let user_id = tokens.verify(&token, TokenKind::Access).unwrap();
        assert_eq!(user_id, UserId::new(42));
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let tokens = token_service();
        let token = tokens.issue(UserId::new(1), TokenKind::Refresh).unwrap();
        assert!(matches!(
            tokens.verify(&token, TokenKind::Access),
            Err(AuthError::WrongTokenKind)
        ));
        assert!(tokens.verify(&token, TokenKind::Refresh).is_ok());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let tokens = token_service();
        let other = TokenService::new(&SecretString::from("another-secret-entirely!!"), 30, 7);
        let token = tokens.issue(UserId::new(1), TokenKind::Access).unwrap();
        assert!(matches!(
            other.verify(&token, TokenKind::Access),
            Err(AuthError::Token(_))
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let tokens = token_service();
        assert!(tokens.verify("not.a.jwt", TokenKind::Access).is_err());
    }
}
