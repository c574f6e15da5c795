//! Order domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use orchard_core::{OrderId, OrderItemId, OrderStatus, Price, UserId};

use super::Product;

/// A single product-and-quantity entry within an order.
///
/// The product is expanded (with its category) on reads; the unit price shown
/// is the product's *current* price, while the owning order's total is fixed
/// at creation time.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    /// Unique line item ID.
    pub id: OrderItemId,
    /// How many units of the product were ordered.
    pub quantity: u32,
    /// The referenced product.
    pub product: Product,
}

/// The placing user, expanded to just the fields order listings need.
#[derive(Debug, Clone, Serialize)]
pub struct OrderUser {
    pub id: UserId,
    pub name: String,
}

/// A placed order with its line items expanded.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    /// Unique order ID.
    pub id: OrderId,
    /// Line items, in the order they were submitted.
    pub order_items: Vec<OrderItem>,
    /// Shipping address line 1.
    pub shipping_address1: String,
    /// Shipping address line 2.
    pub shipping_address2: Option<String>,
    /// Shipping city.
    pub city: String,
    /// Shipping postal code.
    pub zip: String,
    /// Shipping country.
    pub country: String,
    /// Contact phone number.
    pub phone: String,
    /// Current lifecycle status.
    pub status: OrderStatus,
    /// Sum of line totals, computed once at creation and never recomputed.
    pub total_price: Price,
    /// The user who placed the order.
    pub user: OrderUser,
    /// When the order was placed.
    pub date_ordered: DateTime<Utc>,
}
