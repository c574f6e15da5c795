//! Password hashing and bearer token issuance/verification.
//!
//! Passwords are hashed with Argon2id in PHC string format; the original
//! password is never retained. Bearer tokens are HS256 JWTs carrying the
//! user ID and admin flag, valid for 24 hours.

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use orchard_core::UserId;

use crate::models::CurrentUser;

/// How long an issued token stays valid.
const TOKEN_TTL_HOURS: i64 = 24;

/// Errors from credential checks and token handling.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The password did not match the stored hash.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// No user exists for the supplied email.
    #[error("user not found")]
    UserNotFound,

    /// The request carried no `Authorization: Bearer` header.
    #[error("missing bearer token")]
    MissingToken,

    /// The token failed signature or expiry validation.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Hashing or hash parsing failed.
    #[error("password hash error: {0}")]
    Hash(String),

    /// Token signing failed.
    #[error("token issue error: {0}")]
    TokenIssue(String),
}

/// Hash a password with Argon2id and a fresh random salt.
///
/// # Errors
///
/// Returns [`AuthError::Hash`] if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored PHC hash string.
///
/// # Errors
///
/// Returns [`AuthError::Hash`] if the stored hash cannot be parsed and
/// [`AuthError::InvalidCredentials`] if the password does not match.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<(), AuthError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| AuthError::Hash(e.to_string()))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// JWT claims carried by a bearer token.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// User ID.
    sub: i32,
    /// Whether the user may use administrative routes.
    is_admin: bool,
    /// Issued-at (seconds since epoch).
    iat: i64,
    /// Expiry (seconds since epoch).
    exp: i64,
}

/// Signs and verifies HS256 bearer tokens.
#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenSigner {
    /// Build a signer from the configured secret.
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
        }
    }

    /// Issue a token for the given user.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::TokenIssue`] if signing fails.
    pub fn issue(&self, user_id: UserId, is_admin: bool) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.as_i32(),
            is_admin,
            iat: now.timestamp(),
            exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
        };

        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AuthError::TokenIssue(e.to_string()))
    }

    /// Verify a token and extract the caller it identifies.
    ///
    /// Validates the HS256 signature and expiry. Role checks against the
    /// route's requirement happen in the extractors, not here: a valid
    /// non-admin token is a valid token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] if validation fails.
    pub fn verify(&self, token: &str) -> Result<CurrentUser, AuthError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        Ok(CurrentUser {
            user_id: UserId::new(data.claims.sub),
            is_admin: data.claims.is_admin,
        })
    }
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::new(&SecretString::from(
            "an-integration-test-secret-of-enough-length",
        ))
    }

    #[test]
    fn test_password_round_trip() {
        let hash = hash_password("hunter2!").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter2!", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_token_round_trip() {
        let signer = signer();
        let token = signer.issue(UserId::new(42), true).unwrap();
        let current = signer.verify(&token).unwrap();
        assert_eq!(current.user_id, UserId::new(42));
        assert!(current.is_admin);
    }

    #[test]
    fn test_token_rejects_wrong_secret() {
        let token = signer().issue(UserId::new(1), false).unwrap();
        let other = TokenSigner::new(&SecretString::from(
            "a-completely-different-signing-secret!!",
        ));
        assert!(matches!(
            other.verify(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_token_rejects_garbage() {
        assert!(matches!(
            signer().verify("not.a.token"),
            Err(AuthError::InvalidToken(_))
        ));
    }
}
