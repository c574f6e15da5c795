//! HTTP route handlers for the shop API.
//!
//! # Route Structure
//!
//! All resource routes are mounted under the configured prefix (`API_PREFIX`,
//! e.g. `/api/v1`). Public routes need no credential; "auth" routes need a
//! valid bearer token; "admin" routes need a token with the admin flag.
//!
//! ```text
//! # Users
//! GET    /users                       - List users (admin)
//! GET    /users/{id}                  - Fetch one user (auth: self or admin)
//! POST   /users                       - Create a user (admin)
//! POST   /users/register              - Self-registration (public)
//! PUT    /users/{id}                  - Update a user (auth: self or admin)
//! POST   /users/login                 - Login, returns bearer token (public)
//! GET    /users/get/count             - User count (admin)
//! DELETE /users/{id}                  - Delete a user (admin)
//!
//! # Categories
//! GET    /categories                  - List categories (public)
//! GET    /categories/{id}             - Fetch one category (public)
//! POST   /categories                  - Create a category (admin)
//! PUT    /categories/{id}             - Update a category (admin)
//! DELETE /categories/{id}             - Delete a category (admin)
//!
//! # Products
//! GET    /products                    - List products, ?categories=1,2 (public)
//! GET    /products/{id}               - Fetch one product (public)
//! POST   /products                    - Create a product, multipart w/ image (admin)
//! PUT    /products/{id}               - Update a product (admin)
//! DELETE /products/{id}               - Delete a product (admin)
//! GET    /products/get/count          - Product count (admin)
//! GET    /products/get/featured/{count} - Featured products (public)
//!
//! # Orders
//! GET    /orders                      - List all orders, newest first (admin)
//! GET    /orders/{id}                 - Fetch one order, fully expanded (auth: owner or admin)
//! POST   /orders                      - Place an order (auth)
//! PUT    /orders/{id}                 - Update order status (admin)
//! DELETE /orders/{id}                 - Delete an order and its line items (admin)
//! GET    /orders/get/userorders/{userId} - A user's orders (auth: owner or admin)
//! ```

use axum::Router;

use crate::state::AppState;

pub mod categories;
pub mod orders;
pub mod products;
pub mod users;

/// Build the resource router, mounted under the given prefix.
pub fn routes(prefix: &str) -> Router<AppState> {
    let resources = Router::new()
        .nest("/users", users::routes())
        .nest("/categories", categories::routes())
        .nest("/products", products::routes())
        .nest("/orders", orders::routes());

    Router::new().nest(prefix, resources)
}
