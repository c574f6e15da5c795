//! Order route handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use orchard_core::{OrderId, OrderStatus, ProductId, UserId};

use crate::{
    db::{NewOrder, NewOrderItem, OrderRepository},
    error::AppError,
    middleware::{RequireAdmin, RequireAuth},
    models::Order,
    state::AppState,
};

/// A requested line item in an order placement.
#[derive(Debug, Deserialize)]
pub struct OrderItemRequest {
    pub product: ProductId,
    pub quantity: i32,
}

/// Request body for placing an order.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub shipping_address1: String,
    pub shipping_address2: Option<String>,
    pub city: String,
    pub zip: String,
    pub country: String,
    pub phone: String,
    #[serde(default)]
    pub status: OrderStatus,
    pub user: UserId,
    pub order_items: Vec<OrderItemRequest>,
}

/// Request body for a status update.
#[derive(Debug, Deserialize)]
pub struct UpdateOrderRequest {
    pub status: OrderStatus,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/get/userorders/{user_id}", get(list_for_user))
        .route("/{id}", get(get_one).put(update).delete(delete_one))
}

/// List all orders, newest first, fully expanded. Admin only.
///
/// Zero orders is success with an empty list.
#[instrument(skip(_admin, state))]
async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<Order>>, AppError> {
    let orders = OrderRepository::new(state.pool()).list_all().await?;
    Ok(Json(orders))
}

/// Fetch one order with the user's name and the line item -> product ->
/// category chain expanded. Owner or admin.
#[instrument(skip(current, state))]
async fn get_one(
    RequireAuth(current): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>, AppError> {
    let order = OrderRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id} was not found")))?;

    if !current.can_access_user(order.user.id) {
        return Err(AppError::Forbidden(
            "cannot access another user's order".to_string(),
        ));
    }

    Ok(Json(order))
}

/// Place an order. Any authenticated caller; non-admins may only place
/// orders for themselves.
///
/// The line item list must be non-empty with positive quantities. The total
/// is the sum of each referenced product's price at this moment times its
/// quantity; a missing product aborts the whole placement.
#[instrument(skip(current, state, body))]
async fn create(
    RequireAuth(current): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    if !current.can_access_user(body.user) {
        return Err(AppError::Forbidden(
            "cannot place an order for another user".to_string(),
        ));
    }

    if body.order_items.is_empty() {
        return Err(AppError::BadRequest(
            "an order needs at least one line item".to_string(),
        ));
    }
    if body.order_items.iter().any(|item| item.quantity < 1) {
        return Err(AppError::BadRequest(
            "line item quantities must be at least 1".to_string(),
        ));
    }

    let new = NewOrder {
        shipping_address1: body.shipping_address1,
        shipping_address2: body.shipping_address2,
        city: body.city,
        zip: body.zip,
        country: body.country,
        phone: body.phone,
        status: body.status,
        user: body.user,
        items: body
            .order_items
            .into_iter()
            .map(|item| NewOrderItem {
                product: item.product,
                quantity: item.quantity,
            })
            .collect(),
    };

    let order = OrderRepository::new(state.pool()).create(&new).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// Replace an order's status. Admin only. Only transitions the lifecycle
/// allows are accepted; nothing else about the order changes.
#[instrument(skip(_admin, state, body))]
async fn update(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(body): Json<UpdateOrderRequest>,
) -> Result<Json<Order>, AppError> {
    let order = OrderRepository::new(state.pool())
        .update_status(id, body.status)
        .await?;
    Ok(Json(order))
}

/// Delete an order and, with it, all of its line items. Admin only.
///
/// A missing order is 404, distinct from persistence failures.
#[instrument(skip(_admin, state))]
async fn delete_one(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<Value>, AppError> {
    OrderRepository::new(state.pool()).delete(id).await?;
    Ok(Json(
        json!({ "success": true, "message": "the order was deleted" }),
    ))
}

/// List one user's orders, newest first, fully expanded. Owner or admin.
#[instrument(skip(current, state))]
async fn list_for_user(
    RequireAuth(current): RequireAuth,
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<Vec<Order>>, AppError> {
    if !current.can_access_user(user_id) {
        return Err(AppError::Forbidden(
            "cannot access another user's orders".to_string(),
        ));
    }

    let orders = OrderRepository::new(state.pool())
        .list_for_user(user_id)
        .await?;
    Ok(Json(orders))
}
