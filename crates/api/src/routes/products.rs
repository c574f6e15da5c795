//! Product route handlers, including multipart image upload.

use std::collections::HashMap;
use std::str::FromStr;

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::get,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use orchard_core::{CategoryId, Price, ProductId};

use crate::{
    db::{CategoryRepository, NewProduct, ProductRepository},
    error::AppError,
    middleware::RequireAdmin,
    models::Product,
    services::uploads::{self, UploadError},
    state::AppState,
};

/// Query parameters for the product listing.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Comma-separated category IDs, e.g. `?categories=1,3`.
    pub categories: Option<String>,
}

/// Request body for updating a product.
#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: String,
    pub description: String,
    pub rich_description: Option<String>,
    pub image: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub brand: Option<String>,
    pub price: Decimal,
    pub category: CategoryId,
    pub count_in_stock: i32,
    pub rating: Option<Decimal>,
    #[serde(default)]
    pub num_reviews: i32,
    #[serde(default)]
    pub is_featured: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/get/count", get(count))
        .route("/get/featured/{count}", get(featured))
        .route("/{id}", get(get_one).put(update).delete(delete_one))
}

/// List products, optionally filtered by category. Public.
#[instrument(skip(state))]
async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Product>>, AppError> {
    let filter = query.categories.as_deref().map(parse_category_filter).transpose()?;

    let products = ProductRepository::new(state.pool())
        .list(filter.as_deref())
        .await?;
    Ok(Json(products))
}

/// Fetch one product with its category expanded. Public.
#[instrument(skip(state))]
async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>, AppError> {
    let product = ProductRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id} was not found")))?;
    Ok(Json(product))
}

/// Create a product from a multipart form with an `image` part. Admin only.
#[instrument(skip(_admin, state, multipart))]
async fn create(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Product>), AppError> {
    let form = ProductForm::read(multipart).await?;
    let (filename, content_type, data) = form.image.ok_or(UploadError::MissingFile)?;

    let category = parse_field::<CategoryId>(&form.fields, "category")?;
    ensure_category_exists(&state, category).await?;

    let stored = uploads::store_image(
        &state.config().uploads_dir,
        &filename,
        &content_type,
        &data,
    )
    .await?;
    let image_url = uploads::public_url(&state.config().public_base_url, &stored);

    let new = NewProduct {
        name: required_field(&form.fields, "name")?.to_owned(),
        description: required_field(&form.fields, "description")?.to_owned(),
        rich_description: form.fields.get("rich_description").cloned(),
        image: Some(image_url),
        images: Vec::new(),
        brand: form.fields.get("brand").cloned(),
        price: parse_price(parse_field::<Decimal>(&form.fields, "price")?)?,
        category,
        count_in_stock: parse_stock(parse_field::<i32>(&form.fields, "count_in_stock")?)?,
        rating: optional_field::<Decimal>(&form.fields, "rating")?,
        num_reviews: optional_field::<i32>(&form.fields, "num_reviews")?.unwrap_or(0),
        is_featured: optional_field::<bool>(&form.fields, "is_featured")?.unwrap_or(false),
    };

    let product = ProductRepository::new(state.pool()).create(&new).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Update a product. Admin only. The referenced category must exist.
#[instrument(skip(_admin, state, body))]
async fn update(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(body): Json<UpdateProductRequest>,
) -> Result<Json<Product>, AppError> {
    ensure_category_exists(&state, body.category).await?;

    let new = NewProduct {
        name: body.name,
        description: body.description,
        rich_description: body.rich_description,
        image: body.image,
        images: body.images,
        brand: body.brand,
        price: parse_price(body.price)?,
        category: body.category,
        count_in_stock: parse_stock(body.count_in_stock)?,
        rating: body.rating,
        num_reviews: body.num_reviews,
        is_featured: body.is_featured,
    };

    let product = ProductRepository::new(state.pool()).update(id, &new).await?;
    Ok(Json(product))
}

/// Delete a product. Admin only. Fails while order items still reference it.
#[instrument(skip(_admin, state))]
async fn delete_one(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Value>, AppError> {
    ProductRepository::new(state.pool()).delete(id).await?;
    Ok(Json(
        json!({ "success": true, "message": "the product was deleted" }),
    ))
}

/// Count all products. Admin only.
#[instrument(skip(_admin, state))]
async fn count(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let count = ProductRepository::new(state.pool()).count().await?;
    Ok(Json(json!({ "count": count })))
}

/// List featured products, up to the given count. Public.
#[instrument(skip(state))]
async fn featured(
    State(state): State<AppState>,
    Path(count): Path<i64>,
) -> Result<Json<Vec<Product>>, AppError> {
    let products = ProductRepository::new(state.pool())
        .featured(count.max(0))
        .await?;
    Ok(Json(products))
}

// =============================================================================
// Multipart form handling
// =============================================================================

/// The fields of a multipart product form: text fields by name, plus the
/// image part (filename, content type, bytes).
struct ProductForm {
    fields: HashMap<String, String>,
    image: Option<(String, String, Vec<u8>)>,
}

impl ProductForm {
    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut fields = HashMap::new();
        let mut image = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| UploadError::Read(e.to_string()))?
        {
            let name = field.name().unwrap_or_default().to_owned();

            if name == "image" {
                let filename = field.file_name().unwrap_or("upload").to_owned();
                let content_type = field.content_type().unwrap_or_default().to_owned();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| UploadError::Read(e.to_string()))?;
                image = Some((filename, content_type, data.to_vec()));
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| UploadError::Read(e.to_string()))?;
                fields.insert(name, value);
            }
        }

        Ok(Self { fields, image })
    }
}

fn required_field<'a>(
    fields: &'a HashMap<String, String>,
    key: &str,
) -> Result<&'a str, AppError> {
    fields
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| AppError::BadRequest(format!("missing field: {key}")))
}

fn parse_field<T: FromStr>(fields: &HashMap<String, String>, key: &str) -> Result<T, AppError> {
    required_field(fields, key)?
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid value for field: {key}")))
}

fn optional_field<T: FromStr>(
    fields: &HashMap<String, String>,
    key: &str,
) -> Result<Option<T>, AppError> {
    fields
        .get(key)
        .map(|value| {
            value
                .parse()
                .map_err(|_| AppError::BadRequest(format!("invalid value for field: {key}")))
        })
        .transpose()
}

// =============================================================================
// Validation helpers
// =============================================================================

async fn ensure_category_exists(state: &AppState, id: CategoryId) -> Result<(), AppError> {
    CategoryRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::BadRequest(format!("invalid category: {id}")))?;
    Ok(())
}

fn parse_price(raw: Decimal) -> Result<Price, AppError> {
    Price::new(raw).map_err(|e| AppError::BadRequest(e.to_string()))
}

fn parse_stock(raw: i32) -> Result<i32, AppError> {
    if (0..=Product::MAX_STOCK).contains(&raw) {
        Ok(raw)
    } else {
        Err(AppError::BadRequest(format!(
            "count_in_stock must be between 0 and {}",
            Product::MAX_STOCK
        )))
    }
}

/// Parse a `?categories=1,3` filter into category IDs.
fn parse_category_filter(raw: &str) -> Result<Vec<CategoryId>, AppError> {
    raw.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| {
            part.trim()
                .parse::<CategoryId>()
                .map_err(|_| AppError::BadRequest(format!("invalid category id: {part}")))
        })
        .collect()
}
