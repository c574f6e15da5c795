//! Product repository for database operations.
//!
//! Products are always read together with their category, so every select
//! joins `category` and the row type carries both.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use orchard_core::{CategoryId, Price, ProductId};

use super::{RepositoryError, map_constraint};
use crate::models::{Category, Product};

/// Shared select list for product queries (product plus joined category).
pub(crate) const PRODUCT_COLUMNS: &str = r"
    p.id, p.name, p.description, p.rich_description, p.image, p.images,
    p.brand, p.price, p.count_in_stock, p.rating, p.num_reviews,
    p.is_featured, p.date_created,
    c.id AS category_id, c.name AS category_name,
    c.icon AS category_icon, c.color AS category_color
";

/// Internal row type for product queries with the category joined in.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductRow {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub rich_description: Option<String>,
    pub image: Option<String>,
    pub images: Vec<String>,
    pub brand: Option<String>,
    pub price: Decimal,
    pub count_in_stock: i32,
    pub rating: Option<Decimal>,
    pub num_reviews: i32,
    pub is_featured: bool,
    pub date_created: DateTime<Utc>,
    pub category_id: i32,
    pub category_name: String,
    pub category_icon: Option<String>,
    pub category_color: Option<String>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price in database: {e}"))
        })?;

        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            rich_description: row.rich_description,
            image: row.image,
            images: row.images,
            brand: row.brand,
            price,
            category: Category {
                id: CategoryId::new(row.category_id),
                name: row.category_name,
                icon: row.category_icon,
                color: row.category_color,
            },
            count_in_stock: row.count_in_stock,
            rating: row.rating,
            num_reviews: row.num_reviews,
            is_featured: row.is_featured,
            date_created: row.date_created,
        })
    }
}

/// Fields for creating or fully updating a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub rich_description: Option<String>,
    pub image: Option<String>,
    pub images: Vec<String>,
    pub brand: Option<String>,
    pub price: Price,
    pub category: CategoryId,
    pub count_in_stock: i32,
    pub rating: Option<Decimal>,
    pub num_reviews: i32,
    pub is_featured: bool,
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products, optionally restricted to a set of categories.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails and
    /// `RepositoryError::DataCorruption` if a stored price is invalid.
    pub async fn list(
        &self,
        categories: Option<&[CategoryId]>,
    ) -> Result<Vec<Product>, RepositoryError> {
        let filter: Option<Vec<i32>> =
            categories.map(|ids| ids.iter().map(|id| id.as_i32()).collect());

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM product p
            JOIN category c ON c.id = p.category_id
            WHERE $1::int4[] IS NULL OR p.category_id = ANY($1)
            ORDER BY p.id
            ",
        ))
        .bind(filter)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get a product by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails and
    /// `RepositoryError::DataCorruption` if the stored price is invalid.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM product p
            JOIN category c ON c.id = p.category_id
            WHERE p.id = $1
            ",
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Create a new product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the category does not exist
    /// and `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, new: &NewProduct) -> Result<Product, RepositoryError> {
        let (id,): (i32,) = sqlx::query_as(
            r"
            INSERT INTO product
                (name, description, rich_description, image, images, brand,
                 price, category_id, count_in_stock, rating, num_reviews, is_featured)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id
            ",
        )
        .bind(&new.name)
        .bind(&new.description)
        .bind(&new.rich_description)
        .bind(&new.image)
        .bind(&new.images)
        .bind(&new.brand)
        .bind(new.price)
        .bind(new.category)
        .bind(new.count_in_stock)
        .bind(new.rating)
        .bind(new.num_reviews)
        .bind(new.is_featured)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_constraint(e, "product already exists", "unknown category"))?;

        self.get_by_id(ProductId::new(id))
            .await?
            .ok_or_else(|| RepositoryError::DataCorruption("created product vanished".to_string()))
    }

    /// Fully update a product, returning the updated record.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this ID,
    /// `RepositoryError::Conflict` if the category does not exist, and
    /// `RepositoryError::Database` if the update fails.
    pub async fn update(&self, id: ProductId, new: &NewProduct) -> Result<Product, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE product
            SET name = $2, description = $3, rich_description = $4, image = $5,
                images = $6, brand = $7, price = $8, category_id = $9,
                count_in_stock = $10, rating = $11, num_reviews = $12, is_featured = $13
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&new.name)
        .bind(&new.description)
        .bind(&new.rich_description)
        .bind(&new.image)
        .bind(&new.images)
        .bind(&new.brand)
        .bind(new.price)
        .bind(new.category)
        .bind(new.count_in_stock)
        .bind(new.rating)
        .bind(new.num_reviews)
        .bind(new.is_featured)
        .execute(self.pool)
        .await
        .map_err(|e| map_constraint(e, "product already exists", "unknown category"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::DataCorruption("updated product vanished".to_string()))
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this ID and
    /// `RepositoryError::Conflict` if order line items still reference it.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| {
                map_constraint(
                    e,
                    "product already exists",
                    "product is still referenced by orders",
                )
            })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Count all products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// List featured products, newest first, up to `limit`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails and
    /// `RepositoryError::DataCorruption` if a stored price is invalid.
    pub async fn featured(&self, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM product p
            JOIN category c ON c.id = p.category_id
            WHERE p.is_featured
            ORDER BY p.date_created DESC
            LIMIT $1
            ",
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}
