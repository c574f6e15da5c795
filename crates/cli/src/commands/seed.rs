//! Seed the catalog from a YAML file.
//!
//! The file lists categories and the products under them:
//!
//! ```yaml
//! categories:
//!   - name: Fruit
//!     icon: apple
//!     color: "#ff0000"
//!     products:
//!       - name: Apple
//!         description: A crisp apple
//!         price: "0.50"
//!         count_in_stock: 100
//!         is_featured: true
//! ```

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;

/// A category and its products, as read from the seed file.
#[derive(Debug, Deserialize)]
struct SeedCategory {
    name: String,
    icon: Option<String>,
    color: Option<String>,
    #[serde(default)]
    products: Vec<SeedProduct>,
}

#[derive(Debug, Deserialize)]
struct SeedProduct {
    name: String,
    description: String,
    #[serde(default)]
    brand: Option<String>,
    price: Decimal,
    count_in_stock: i32,
    #[serde(default)]
    is_featured: bool,
}

#[derive(Debug, Deserialize)]
struct SeedFile {
    categories: Vec<SeedCategory>,
}

/// Seed categories and products from a YAML file.
///
/// # Arguments
///
/// * `file_path` - Path to the YAML seed file
/// * `clear_existing` - If true, delete existing categories and products first
///
/// # Errors
///
/// Returns an error if `DATABASE_URL` is missing, the file cannot be read,
/// or database operations fail. Clearing fails while orders still reference
/// any product.
pub async fn catalog(file_path: &str, clear_existing: bool) -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL not set")?;

    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading seed data from file");

    // Read and parse the YAML before connecting to the database
    let content = tokio::fs::read_to_string(path).await?;
    let seed: SeedFile = serde_yaml::from_str(&content)?;

    let product_count: usize = seed.categories.iter().map(|c| c.products.len()).sum();
    info!(
        categories = seed.categories.len(),
        products = product_count,
        "Parsed seed file"
    );

    let pool = PgPool::connect(&database_url).await?;
    info!("Connected to database");

    if clear_existing {
        info!("Clearing existing catalog");
        sqlx::query("DELETE FROM product").execute(&pool).await?;
        sqlx::query("DELETE FROM category").execute(&pool).await?;
    }

    let mut inserted = 0_usize;
    for category in &seed.categories {
        let category_id = sqlx::query_scalar::<_, i32>(
            "INSERT INTO category (name, icon, color) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&category.name)
        .bind(category.icon.as_deref())
        .bind(category.color.as_deref())
        .fetch_one(&pool)
        .await?;

        for product in &category.products {
            sqlx::query(
                r"
                INSERT INTO product
                    (name, description, brand, price, category_id, count_in_stock, is_featured)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ",
            )
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.brand.as_deref())
            .bind(product.price)
            .bind(category_id)
            .bind(product.count_in_stock)
            .bind(product.is_featured)
            .execute(&pool)
            .await?;
            inserted += 1;
        }
    }

    info!("Seeding complete!");
    info!("  Categories inserted: {}", seed.categories.len());
    info!("  Products inserted: {inserted}");

    Ok(())
}
