//! Category route handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use orchard_core::CategoryId;

use crate::{
    db::CategoryRepository, error::AppError, middleware::RequireAdmin, models::Category,
    state::AppState,
};

/// Request body for creating or updating a category.
#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(get_one).put(update).delete(delete_one))
}

/// List all categories. Public.
#[instrument(skip(state))]
async fn list(State(state): State<AppState>) -> Result<Json<Vec<Category>>, AppError> {
    let categories = CategoryRepository::new(state.pool()).list_all().await?;
    Ok(Json(categories))
}

/// Fetch one category. Public.
#[instrument(skip(state))]
async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Json<Category>, AppError> {
    let category = CategoryRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("category {id} was not found")))?;
    Ok(Json(category))
}

/// Create a category. Admin only.
#[instrument(skip(_admin, state, body))]
async fn create(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(body): Json<CategoryRequest>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    let category = CategoryRepository::new(state.pool())
        .create(&body.name, body.icon.as_deref(), body.color.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// Update a category. Admin only.
#[instrument(skip(_admin, state, body))]
async fn update(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
    Json(body): Json<CategoryRequest>,
) -> Result<Json<Category>, AppError> {
    let category = CategoryRepository::new(state.pool())
        .update(id, &body.name, body.icon.as_deref(), body.color.as_deref())
        .await?;
    Ok(Json(category))
}

/// Delete a category. Admin only. Fails while products still reference it.
#[instrument(skip(_admin, state))]
async fn delete_one(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Json<Value>, AppError> {
    CategoryRepository::new(state.pool()).delete(id).await?;
    Ok(Json(
        json!({ "success": true, "message": "the category was deleted" }),
    ))
}
