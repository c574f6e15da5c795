//! Integration tests for the category and product catalog.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The API server running (cargo run -p orchard-api)
//! - The seeded admin account (orchard-cli admin create)
//!
//! Run with: cargo test -p orchard-integration-tests -- --ignored

use orchard_integration_tests::{
    admin_token, api_base_url, client, create_category, create_product, login, register_user,
    unique_email,
};
use reqwest::StatusCode;
use serde_json::{Value, json};
use uuid::Uuid;

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_category_crud() {
    let client = client();
    let base_url = api_base_url();
    let admin = admin_token(&client).await;

    let name = format!("crud-category-{}", Uuid::new_v4());
    let id = create_category(&client, &admin, &name).await;

    // Public read
    let resp = client
        .get(format!("{base_url}/categories/{id}"))
        .send()
        .await
        .expect("Failed to fetch category");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse category");
    assert_eq!(body["name"], Value::String(name));

    // Update
    let resp = client
        .put(format!("{base_url}/categories/{id}"))
        .bearer_auth(&admin)
        .json(&json!({ "name": "Renamed Category", "icon": "tag", "color": "#123456" }))
        .send()
        .await
        .expect("Failed to update category");
    assert_eq!(resp.status(), StatusCode::OK);

    // Delete
    let resp = client
        .delete(format!("{base_url}/categories/{id}"))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to delete category");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse delete body");
    assert_eq!(body["success"], Value::Bool(true));

    // Gone
    let resp = client
        .get(format!("{base_url}/categories/{id}"))
        .send()
        .await
        .expect("Failed to re-fetch category");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_category_writes_require_admin() {
    let client = client();
    let base_url = api_base_url();

    // Unauthenticated
    let resp = client
        .post(format!("{base_url}/categories"))
        .json(&json!({ "name": "No Token" }))
        .send()
        .await
        .expect("Failed to send create");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Regular user
    let email = unique_email("catwriter");
    register_user(&client, &email, "not an admin").await;
    let token = login(&client, &email, "not an admin").await;

    let resp = client
        .post(format!("{base_url}/categories"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Still No" }))
        .send()
        .await
        .expect("Failed to send create");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_category_with_products_cannot_be_deleted() {
    let client = client();
    let base_url = api_base_url();
    let admin = admin_token(&client).await;

    let category_id = create_category(
        &client,
        &admin,
        &format!("occupied-{}", Uuid::new_v4()),
    )
    .await;
    create_product(&client, &admin, "Blocking Product", "3.50", category_id).await;

    let resp = client
        .delete(format!("{base_url}/categories/{category_id}"))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to attempt delete");

    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_product_create_and_filter_by_category() {
    let client = client();
    let base_url = api_base_url();
    let admin = admin_token(&client).await;

    let category_id = create_category(&client, &admin, &format!("filter-{}", Uuid::new_v4())).await;
    let product_id = create_product(&client, &admin, "Filtered Product", "12.34", category_id).await;

    // The product comes back with its category expanded
    let resp = client
        .get(format!("{base_url}/products/{product_id}"))
        .send()
        .await
        .expect("Failed to fetch product");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse product");
    assert_eq!(body["category"]["id"].as_i64(), Some(i64::from(category_id)));
    assert!(
        body["image"]
            .as_str()
            .expect("product has an image URL")
            .contains("/public/uploads/")
    );

    // Filtering on the fresh category returns exactly this product
    let resp = client
        .get(format!("{base_url}/products?categories={category_id}"))
        .send()
        .await
        .expect("Failed to list products");
    assert_eq!(resp.status(), StatusCode::OK);
    let list: Vec<Value> = resp.json().await.expect("Failed to parse product list");
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"].as_i64(), Some(i64::from(product_id)));

    // A malformed filter is a client error, not an empty list
    let resp = client
        .get(format!("{base_url}/products?categories=nope"))
        .send()
        .await
        .expect("Failed to send bad filter");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_product_create_rejects_unknown_category() {
    let client = client();
    let base_url = api_base_url();
    let admin = admin_token(&client).await;

    let form = reqwest::multipart::Form::new()
        .text("name", "Orphan Product")
        .text("description", "points at a category that does not exist")
        .text("price", "1.00")
        .text("category", "999999")
        .text("count_in_stock", "1")
        .part(
            "image",
            reqwest::multipart::Part::bytes(orchard_integration_tests::tiny_png())
                .file_name("orphan.png")
                .mime_str("image/png")
                .expect("Invalid mime type"),
        );

    let resp = client
        .post(format!("{base_url}/products"))
        .bearer_auth(&admin)
        .multipart(form)
        .send()
        .await
        .expect("Failed to send create");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_featured_products_respect_limit() {
    let client = client();
    let base_url = api_base_url();
    let admin = admin_token(&client).await;

    let category_id = create_category(&client, &admin, &format!("featured-{}", Uuid::new_v4())).await;

    // Mark two products featured via update
    for name in ["Featured One", "Featured Two"] {
        let id = create_product(&client, &admin, name, "5.00", category_id).await;
        let resp = client
            .put(format!("{base_url}/products/{id}"))
            .bearer_auth(&admin)
            .json(&json!({
                "name": name,
                "description": "featured",
                "price": "5.00",
                "category": category_id,
                "count_in_stock": 10,
                "is_featured": true,
            }))
            .send()
            .await
            .expect("Failed to feature product");
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = client
        .get(format!("{base_url}/products/get/featured/1"))
        .send()
        .await
        .expect("Failed to fetch featured");
    assert_eq!(resp.status(), StatusCode::OK);
    let list: Vec<Value> = resp.json().await.expect("Failed to parse featured list");
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["is_featured"], Value::Bool(true));
}
