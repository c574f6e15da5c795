//! Database operations for the shop `PostgreSQL` database.
//!
//! # Tables
//!
//! - `app_user` - Registered users and their password hashes
//! - `category` - Product categories
//! - `product` - Catalog products (references `category`)
//! - `orders` - Placed orders (references `app_user`)
//! - `order_item` - Order line items (owned by `orders`, reference `product`)
//!
//! Referential policy: deleting an order cascades to its line items; users,
//! products, and categories cannot be deleted while still referenced.
//!
//! # Migrations
//!
//! Migrations live in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p orchard-cli -- migrate
//! ```

pub mod categories;
pub mod orders;
pub mod products;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use orchard_core::OrderStatus;

pub use categories::CategoryRepository;
pub use orders::{NewOrder, NewOrderItem, OrderRepository};
pub use products::{NewProduct, ProductRepository};
pub use users::{NewUser, UserRepository, UserUpdate};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g. unique email, entity still referenced).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A write referenced an entity that does not exist.
    #[error("missing reference: {0}")]
    MissingReference(String),

    /// An order status update that the lifecycle does not allow.
    #[error("illegal status transition: {from} -> {to}")]
    InvalidTransition {
        /// The order's current status.
        from: OrderStatus,
        /// The requested status.
        to: OrderStatus,
    },
}

/// `PostgreSQL` error code for unique constraint violations.
const PG_UNIQUE_VIOLATION: &str = "23505";
/// `PostgreSQL` error code for foreign key violations.
const PG_FOREIGN_KEY_VIOLATION: &str = "23503";

/// Translate constraint violations into the repository taxonomy.
///
/// `on_conflict` becomes the message for unique violations and
/// `on_fk` the message for foreign key violations; anything else stays a
/// plain database error.
pub(crate) fn map_constraint(err: sqlx::Error, on_conflict: &str, on_fk: &str) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            Some(PG_UNIQUE_VIOLATION) => return RepositoryError::Conflict(on_conflict.to_owned()),
            Some(PG_FOREIGN_KEY_VIOLATION) => {
                return RepositoryError::Conflict(on_fk.to_owned());
            }
            _ => {}
        }
    }
    RepositoryError::Database(err)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
