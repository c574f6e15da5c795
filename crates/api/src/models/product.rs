//! Product domain type.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use orchard_core::{Price, ProductId};

use super::Category;

/// A product in the catalog, with its category expanded.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Short description.
    pub description: String,
    /// Long-form description (HTML allowed).
    pub rich_description: Option<String>,
    /// Primary image URL.
    pub image: Option<String>,
    /// Gallery image URLs.
    pub images: Vec<String>,
    /// Brand name.
    pub brand: Option<String>,
    /// Unit price.
    pub price: Price,
    /// The category this product belongs to.
    pub category: Category,
    /// Units currently in stock.
    pub count_in_stock: i32,
    /// Average review rating.
    pub rating: Option<Decimal>,
    /// Number of reviews behind the rating.
    pub num_reviews: i32,
    /// Whether the product is featured on the home page.
    pub is_featured: bool,
    /// When the product was created.
    pub date_created: DateTime<Utc>,
}

impl Product {
    /// Stock counts are stored as an i32 but constrained to a single byte,
    /// matching what the storefront UI can display.
    pub const MAX_STOCK: i32 = 255;
}
