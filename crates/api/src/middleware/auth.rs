//! Authentication extractors for bearer tokens.
//!
//! Routes opt in to authentication by taking one of these extractors as a
//! handler argument; everything else is public. A credential is rejected
//! only when it fails validation or its embedded role does not meet the
//! route's requirement - a valid customer token is never treated as revoked
//! on admin-capable routes that accept customers.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::AppError;
use crate::models::CurrentUser;
use crate::services::auth::AuthError;
use crate::state::AppState;

/// Extractor that requires a valid bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn place_order(
///     RequireAuth(current): RequireAuth,
///     State(state): State<AppState>,
/// ) -> Result<Json<Order>, AppError> {
///     // current.user_id identifies the caller
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        Ok(Self(bearer_user(parts, &state)?))
    }
}

/// Extractor that requires a valid bearer token with the admin flag set.
///
/// Non-admin callers get 403 Forbidden; missing or invalid tokens get 401.
pub struct RequireAdmin(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let current = bearer_user(parts, &state)?;

        if !current.is_admin {
            return Err(AppError::Forbidden(
                "administrator access required".to_string(),
            ));
        }

        Ok(Self(current))
    }
}

/// Pull the caller out of the `Authorization: Bearer` header.
fn bearer_user(parts: &Parts, state: &AppState) -> Result<CurrentUser, AuthError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?;

    let token = header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(AuthError::MissingToken)?;

    state.tokens().verify(token)
}
