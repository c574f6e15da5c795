//! Order repository: placement, expanded reads, status updates, deletion.
//!
//! Order placement is a single transaction: the order row, its line items,
//! and the price resolution for the total all commit or roll back together,
//! so a failed placement can never leave orphaned line items behind.

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use orchard_core::{OrderId, OrderItemId, OrderStatus, Price, ProductId, UserId};

use super::products::{PRODUCT_COLUMNS, ProductRow};
use super::{RepositoryError, map_constraint};
use crate::models::{Order, OrderItem, OrderUser, Product};

/// Internal row type for order queries with the placing user's name joined.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    shipping_address1: String,
    shipping_address2: Option<String>,
    city: String,
    zip: String,
    country: String,
    phone: String,
    status: String,
    total_price: Decimal,
    user_id: i32,
    user_name: String,
    date_ordered: chrono::DateTime<chrono::Utc>,
}

/// Internal row type for line item queries with the product (and its
/// category) joined.
#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    item_id: i32,
    order_id: i32,
    quantity: i32,
    #[sqlx(flatten)]
    product: ProductRow,
}

const ORDER_COLUMNS: &str = r"
    o.id, o.shipping_address1, o.shipping_address2, o.city, o.zip,
    o.country, o.phone, o.status, o.total_price, o.user_id,
    u.name AS user_name, o.date_ordered
";

impl OrderItemRow {
    fn into_item(self) -> Result<(i32, OrderItem), RepositoryError> {
        let quantity = u32::try_from(self.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "negative quantity in line item {}",
                self.item_id
            ))
        })?;
        let product: Product = self.product.try_into()?;

        Ok((
            self.order_id,
            OrderItem {
                id: OrderItemId::new(self.item_id),
                quantity,
                product,
            },
        ))
    }
}

/// Combine an order row with its already-expanded line items.
fn build_order(row: OrderRow, order_items: Vec<OrderItem>) -> Result<Order, RepositoryError> {
    let status: OrderStatus = row.status.parse().map_err(|_| {
        RepositoryError::DataCorruption(format!(
            "unknown status '{}' on order {}",
            row.status, row.id
        ))
    })?;
    let total_price = Price::new(row.total_price).map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid total on order {}: {e}", row.id))
    })?;

    Ok(Order {
        id: OrderId::new(row.id),
        order_items,
        shipping_address1: row.shipping_address1,
        shipping_address2: row.shipping_address2,
        city: row.city,
        zip: row.zip,
        country: row.country,
        phone: row.phone,
        status,
        total_price,
        user: OrderUser {
            id: UserId::new(row.user_id),
            name: row.user_name,
        },
        date_ordered: row.date_ordered,
    })
}

/// A requested (product, quantity) pair for order placement.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product: ProductId,
    pub quantity: i32,
}

/// Fields for placing an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub shipping_address1: String,
    pub shipping_address2: Option<String>,
    pub city: String,
    pub zip: String,
    pub country: String,
    pub phone: String,
    pub status: OrderStatus,
    pub user: UserId,
    pub items: Vec<NewOrderItem>,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place an order.
    ///
    /// Runs as one transaction: inserts the order, inserts each line item,
    /// resolves each referenced product's current price, and writes the sum
    /// of `price x quantity` as the total. The total is fixed here and never
    /// recomputed, even if product prices change later. An empty item list
    /// produces a total of exactly zero.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::MissingReference` if any referenced product
    /// does not exist (the whole placement is rolled back),
    /// `RepositoryError::Conflict` if the user does not exist, and
    /// `RepositoryError::Database` on any other failure.
    pub async fn create(&self, new: &NewOrder) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let (order_id,): (i32,) = sqlx::query_as(
            r"
            INSERT INTO orders
                (shipping_address1, shipping_address2, city, zip, country,
                 phone, status, total_price, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 0, $8)
            RETURNING id
            ",
        )
        .bind(&new.shipping_address1)
        .bind(&new.shipping_address2)
        .bind(&new.city)
        .bind(&new.zip)
        .bind(&new.country)
        .bind(&new.phone)
        .bind(new.status.as_str())
        .bind(new.user)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_constraint(e, "order already exists", "unknown user"))?;

        let mut total = Price::ZERO;
        for item in &new.items {
            let quantity = u32::try_from(item.quantity).map_err(|_| {
                RepositoryError::MissingReference(format!(
                    "invalid quantity {} for product {}",
                    item.quantity, item.product
                ))
            })?;

            let unit_price = Self::resolve_price(&mut tx, item.product).await?;

            sqlx::query(
                "INSERT INTO order_item (order_id, product_id, quantity) VALUES ($1, $2, $3)",
            )
            .bind(order_id)
            .bind(item.product)
            .bind(item.quantity)
            .execute(&mut *tx)
            .await?;

            total = [total, unit_price.line_total(quantity)].into_iter().sum();
        }

        sqlx::query("UPDATE orders SET total_price = $2 WHERE id = $1")
            .bind(order_id)
            .bind(total)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.get_by_id(OrderId::new(order_id))
            .await?
            .ok_or_else(|| RepositoryError::DataCorruption("created order vanished".to_string()))
    }

    /// Resolve a product's current unit price inside the placement
    /// transaction. A missing product aborts the whole placement.
    async fn resolve_price(
        tx: &mut Transaction<'_, Postgres>,
        product: ProductId,
    ) -> Result<Price, RepositoryError> {
        let price: Option<Decimal> = sqlx::query_scalar("SELECT price FROM product WHERE id = $1")
            .bind(product)
            .fetch_optional(&mut **tx)
            .await?;

        let Some(price) = price else {
            return Err(RepositoryError::MissingReference(format!(
                "unknown product: {product}"
            )));
        };

        Price::new(price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price on product {product}: {e}"))
        })
    }

    /// Get an order by its ID, with the user's name and the full line item
    /// -> product -> category chain expanded.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails and
    /// `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS}
            FROM orders o
            JOIN app_user u ON u.id = o.user_id
            WHERE o.id = $1
            ",
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut items = self.fetch_items(&[row.id]).await?;
        let order_items = items.remove(&row.id).unwrap_or_default();
        build_order(row, order_items).map(Some)
    }

    /// List all orders, fully expanded, newest first.
    ///
    /// Zero orders is an empty list, not an error.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails and
    /// `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS}
            FROM orders o
            JOIN app_user u ON u.id = o.user_id
            ORDER BY o.date_ordered DESC
            ",
        ))
        .fetch_all(self.pool)
        .await?;

        self.assemble(rows).await
    }

    /// List one user's orders, fully expanded, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails and
    /// `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn list_for_user(&self, user: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS}
            FROM orders o
            JOIN app_user u ON u.id = o.user_id
            WHERE o.user_id = $1
            ORDER BY o.date_ordered DESC
            ",
        ))
        .bind(user)
        .fetch_all(self.pool)
        .await?;

        self.assemble(rows).await
    }

    /// Replace an order's status, returning the updated order.
    ///
    /// The current status is locked and the transition checked against the
    /// lifecycle rules before the write.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no order has this ID,
    /// `RepositoryError::InvalidTransition` if the lifecycle forbids the
    /// change, and `RepositoryError::Database` on query failure.
    pub async fn update_status(
        &self,
        id: OrderId,
        next: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current: Option<String> =
            sqlx::query_scalar("SELECT status FROM orders WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let current = current.ok_or(RepositoryError::NotFound)?;
        let current: OrderStatus = current.parse().map_err(|_| {
            RepositoryError::DataCorruption(format!("unknown status '{current}' on order {id}"))
        })?;

        if !current.can_transition_to(next) {
            return Err(RepositoryError::InvalidTransition {
                from: current,
                to: next,
            });
        }

        sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(next.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::DataCorruption("updated order vanished".to_string()))
    }

    /// Delete an order. Its line items go with it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no order has this ID - distinct
    /// from `RepositoryError::Database` for persistence failures.
    pub async fn delete(&self, id: OrderId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Fetch the expanded line items for a set of orders, grouped by order
    /// ID and kept in submission order.
    async fn fetch_items(
        &self,
        order_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<OrderItem>>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderItemRow>(&format!(
            r"
            SELECT oi.id AS item_id, oi.order_id, oi.quantity, {PRODUCT_COLUMNS}
            FROM order_item oi
            JOIN product p ON p.id = oi.product_id
            JOIN category c ON c.id = p.category_id
            WHERE oi.order_id = ANY($1)
            ORDER BY oi.id
            ",
        ))
        .bind(order_ids)
        .fetch_all(self.pool)
        .await?;

        let mut grouped: HashMap<i32, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            let (order_id, item) = row.into_item()?;
            grouped.entry(order_id).or_default().push(item);
        }
        Ok(grouped)
    }

    /// Expand a batch of order rows into full orders.
    async fn assemble(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let mut items = self.fetch_items(&ids).await?;

        rows.into_iter()
            .map(|row| {
                let order_items = items.remove(&row.id).unwrap_or_default();
                build_order(row, order_items)
            })
            .collect()
    }
}
