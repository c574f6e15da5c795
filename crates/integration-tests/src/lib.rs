//! Integration tests for Orchard.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database and run migrations
//! docker compose up -d db
//! cargo run -p orchard-cli -- migrate
//!
//! # Create the admin user the tests log in as
//! orchard-cli admin create -e admin@example.com -n Admin -p admin-password
//!
//! # Start the API server, then run the ignored tests
//! cargo run -p orchard-api &
//! cargo test -p orchard-integration-tests -- --ignored
//! ```
//!
//! The tests talk to a running server over HTTP; they create their own
//! categories, products, users, and orders with unique names so they can run
//! against a shared database.

use reqwest::Client;
use serde_json::{Value, json};
use uuid::Uuid;

/// Base URL for the API (configurable via environment).
#[must_use]
pub fn api_base_url() -> String {
    std::env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:3000/api/v1".to_string())
}

/// Plain HTTP client.
///
/// # Panics
///
/// Panics if the client cannot be constructed.
#[must_use]
pub fn client() -> Client {
    Client::builder().build().expect("Failed to create HTTP client")
}

/// A unique email address for a throwaway test user.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", Uuid::new_v4())
}

/// Register a user through the public endpoint and return its JSON view.
///
/// # Panics
///
/// Panics if the request fails or the server rejects the registration.
pub async fn register_user(client: &Client, email: &str, password: &str) -> Value {
    let base_url = api_base_url();
    let resp = client
        .post(format!("{base_url}/users/register"))
        .json(&json!({
            "name": "Integration Test",
            "email": email,
            "password": password,
        }))
        .send()
        .await
        .expect("Failed to register user");

    assert_eq!(resp.status(), reqwest::StatusCode::CREATED);
    resp.json().await.expect("Failed to parse registered user")
}

/// Log in and return the bearer token.
///
/// # Panics
///
/// Panics if the request fails or the credentials are rejected.
pub async fn login(client: &Client, email: &str, password: &str) -> String {
    let base_url = api_base_url();
    let resp = client
        .post(format!("{base_url}/users/login"))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to log in");

    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse login response");
    body["token"]
        .as_str()
        .expect("Login response has no token")
        .to_string()
}

/// Log in as the seeded admin user.
///
/// Uses `ADMIN_EMAIL` / `ADMIN_PASSWORD` from the environment, defaulting to
/// the account created in the setup instructions above.
pub async fn admin_token(client: &Client) -> String {
    let email =
        std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.com".to_string());
    let password =
        std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin-password".to_string());
    login(client, &email, &password).await
}

/// Create a category and return its ID.
///
/// # Panics
///
/// Panics if the request fails or is rejected.
pub async fn create_category(client: &Client, token: &str, name: &str) -> i32 {
    let base_url = api_base_url();
    let resp = client
        .post(format!("{base_url}/categories"))
        .bearer_auth(token)
        .json(&json!({ "name": name, "icon": "leaf", "color": "#00aa00" }))
        .send()
        .await
        .expect("Failed to create category");

    assert_eq!(resp.status(), reqwest::StatusCode::CREATED);
    let body: Value = resp.json().await.expect("Failed to parse category");
    i32::try_from(body["id"].as_i64().expect("Category has no id")).expect("id out of range")
}

/// A tiny valid PNG (1x1 pixel) for upload tests.
#[must_use]
pub fn tiny_png() -> Vec<u8> {
    vec![
        0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48,
        0x44, 0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00,
        0x00, 0x1f, 0x15, 0xc4, 0x89, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x44, 0x41, 0x54, 0x78,
        0x9c, 0x62, 0x00, 0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0d, 0x0a, 0x2d, 0xb4, 0x00,
        0x00, 0x00, 0x00, 0x49, 0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
    ]
}

/// Create a product via the multipart endpoint and return its ID.
///
/// # Panics
///
/// Panics if the request fails or is rejected.
pub async fn create_product(
    client: &Client,
    token: &str,
    name: &str,
    price: &str,
    category_id: i32,
) -> i32 {
    let base_url = api_base_url();
    let form = reqwest::multipart::Form::new()
        .text("name", name.to_string())
        .text("description", "created by an integration test")
        .text("price", price.to_string())
        .text("category", category_id.to_string())
        .text("count_in_stock", "10")
        .part(
            "image",
            reqwest::multipart::Part::bytes(tiny_png())
                .file_name("test.png")
                .mime_str("image/png")
                .expect("Invalid mime type"),
        );

    let resp = client
        .post(format!("{base_url}/products"))
        .bearer_auth(token)
        .multipart(form)
        .send()
        .await
        .expect("Failed to create product");

    assert_eq!(resp.status(), reqwest::StatusCode::CREATED);
    let body: Value = resp.json().await.expect("Failed to parse product");
    i32::try_from(body["id"].as_i64().expect("Product has no id")).expect("id out of range")
}
