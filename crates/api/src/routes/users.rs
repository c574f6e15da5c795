//! User route handlers: CRUD, registration, and login.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use orchard_core::{Email, UserId};

use crate::{
    db::{NewUser, UserRepository, UserUpdate},
    error::AppError,
    middleware::{RequireAdmin, RequireAuth},
    models::UserView,
    services::auth::{self, AuthError},
    state::AppState,
};

/// Request body for creating a user (admin) or self-registering (public).
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    pub street: Option<String>,
    pub apartment: Option<String>,
    pub zip: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

/// Request body for updating a user. The password is optional; when absent
/// the stored hash is kept.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: String,
    pub email: String,
    pub password: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    pub street: Option<String>,
    pub apartment: Option<String>,
    pub zip: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/get/count", get(count))
        .route("/{id}", get(get_one).put(update).delete(delete_one))
}

/// List all users, password hashes omitted. Admin only.
#[instrument(skip(_admin, state))]
async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserView>>, AppError> {
    let users = UserRepository::new(state.pool()).list_all().await?;
    Ok(Json(users.into_iter().map(UserView::from).collect()))
}

/// Fetch one user. Callers may fetch themselves; admins may fetch anyone.
#[instrument(skip(current, state))]
async fn get_one(
    RequireAuth(current): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<UserView>, AppError> {
    if !current.can_access_user(id) {
        return Err(AppError::Forbidden(
            "cannot access another user's account".to_string(),
        ));
    }

    let user = UserRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {id} was not found")))?;
    Ok(Json(user.into()))
}

/// Create a user with an arbitrary admin flag. Admin only.
#[instrument(skip(_admin, state, body))]
async fn create(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserView>), AppError> {
    let user = insert_user(&state, body).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Public self-registration. The admin flag is forced off.
#[instrument(skip(state, body))]
async fn register(
    State(state): State<AppState>,
    Json(mut body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserView>), AppError> {
    body.is_admin = false;
    let user = insert_user(&state, body).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn insert_user(state: &AppState, body: CreateUserRequest) -> Result<UserView, AppError> {
    let email = Email::parse(&body.email).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let password_hash = auth::hash_password(&body.password)?;

    let user = UserRepository::new(state.pool())
        .create(&NewUser {
            name: body.name,
            email,
            password_hash,
            phone: body.phone,
            is_admin: body.is_admin,
            street: body.street,
            apartment: body.apartment,
            zip: body.zip,
            city: body.city,
            country: body.country,
        })
        .await?;

    Ok(user.into())
}

/// Update a user. Callers may update themselves; admins may update anyone.
/// Only admins may change the admin flag.
#[instrument(skip(current, state, body))]
async fn update(
    RequireAuth(current): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<UserView>, AppError> {
    if !current.can_access_user(id) {
        return Err(AppError::Forbidden(
            "cannot update another user's account".to_string(),
        ));
    }

    let email = Email::parse(&body.email).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let password_hash = body
        .password
        .as_deref()
        .map(auth::hash_password)
        .transpose()?;

    let repo = UserRepository::new(state.pool());

    // Non-admins keep whatever admin flag they already have
    let is_admin = if current.is_admin {
        body.is_admin
    } else {
        repo.get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {id} was not found")))?
            .is_admin
    };

    let user = repo
        .update(
            id,
            &UserUpdate {
                name: body.name,
                email,
                password_hash,
                phone: body.phone,
                is_admin,
                street: body.street,
                apartment: body.apartment,
                zip: body.zip,
                city: body.city,
                country: body.country,
            },
        )
        .await?;

    Ok(Json(user.into()))
}

/// Public login. Verifies the password and issues a bearer token carrying
/// the user ID and admin flag.
#[instrument(skip(state, body))]
async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let email = Email::parse(&body.email).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let user = UserRepository::new(state.pool())
        .get_by_email(&email)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    auth::verify_password(&body.password, &user.password_hash)?;

    let token = state.tokens().issue(user.id, user.is_admin)?;
    Ok(Json(json!({ "user": user.email, "token": token })))
}

/// Count registered users. Admin only.
#[instrument(skip(_admin, state))]
async fn count(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let count = UserRepository::new(state.pool()).count().await?;
    Ok(Json(json!({ "count": count })))
}

/// Delete a user. Admin only. Fails while orders still reference them.
#[instrument(skip(_admin, state))]
async fn delete_one(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<Value>, AppError> {
    UserRepository::new(state.pool()).delete(id).await?;
    Ok(Json(
        json!({ "success": true, "message": "the user was deleted" }),
    ))
}
