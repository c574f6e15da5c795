//! Integration tests for user registration, login, and account access.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The API server running (cargo run -p orchard-api)
//! - The seeded admin account (orchard-cli admin create)
//!
//! Run with: cargo test -p orchard-integration-tests -- --ignored

use orchard_integration_tests::{
    admin_token, api_base_url, client, login, register_user, unique_email,
};
use reqwest::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_register_login_and_fetch_self() {
    let client = client();
    let base_url = api_base_url();

    let email = unique_email("register");
    let user = register_user(&client, &email, "correct horse battery").await;

    // Registration never grants admin, and never leaks the password
    assert_eq!(user["is_admin"], Value::Bool(false));
    assert!(user.get("password_hash").is_none());

    let token = login(&client, &email, "correct horse battery").await;
    let id = user["id"].as_i64().expect("registered user has an id");

    let resp = client
        .get(format!("{base_url}/users/{id}"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to fetch own account");

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse user");
    assert_eq!(body["email"], Value::String(email));
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_register_duplicate_email_conflicts() {
    let client = client();
    let base_url = api_base_url();

    let email = unique_email("duplicate");
    register_user(&client, &email, "first password").await;

    let resp = client
        .post(format!("{base_url}/users/register"))
        .json(&json!({
            "name": "Second Registration",
            "email": email,
            "password": "second password",
        }))
        .send()
        .await
        .expect("Failed to send duplicate registration");

    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = resp.json().await.expect("Failed to parse error body");
    assert_eq!(body["success"], Value::Bool(false));
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_login_wrong_password_rejected() {
    let client = client();
    let base_url = api_base_url();

    let email = unique_email("badlogin");
    register_user(&client, &email, "the real password").await;

    let resp = client
        .post(format!("{base_url}/users/login"))
        .json(&json!({ "email": email, "password": "not the password" }))
        .send()
        .await
        .expect("Failed to send login");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_cannot_fetch_another_users_account() {
    let client = client();
    let base_url = api_base_url();

    let first = register_user(&client, &unique_email("first"), "password one").await;
    let second_email = unique_email("second");
    register_user(&client, &second_email, "password two").await;
    let second_token = login(&client, &second_email, "password two").await;

    let first_id = first["id"].as_i64().expect("first user has an id");
    let resp = client
        .get(format!("{base_url}/users/{first_id}"))
        .bearer_auth(&second_token)
        .send()
        .await
        .expect("Failed to fetch other account");

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_user_list_and_count_are_admin_only() {
    let client = client();
    let base_url = api_base_url();

    // No token at all
    let resp = client
        .get(format!("{base_url}/users"))
        .send()
        .await
        .expect("Failed to list users");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // A regular user's token
    let email = unique_email("nonadmin");
    register_user(&client, &email, "plain password").await;
    let token = login(&client, &email, "plain password").await;

    let resp = client
        .get(format!("{base_url}/users/get/count"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to count users");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // The admin token
    let admin = admin_token(&client).await;
    let resp = client
        .get(format!("{base_url}/users/get/count"))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to count users as admin");
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.expect("Failed to parse count");
    assert!(body["count"].as_i64().expect("count is a number") >= 2);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_non_admin_update_keeps_admin_flag_off() {
    let client = client();
    let base_url = api_base_url();

    let email = unique_email("selfupdate");
    let user = register_user(&client, &email, "before update").await;
    let token = login(&client, &email, "before update").await;
    let id = user["id"].as_i64().expect("user has an id");

    // Try to self-promote while renaming
    let resp = client
        .put(format!("{base_url}/users/{id}"))
        .bearer_auth(&token)
        .json(&json!({
            "name": "Renamed",
            "email": email,
            "is_admin": true,
        }))
        .send()
        .await
        .expect("Failed to update account");

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse updated user");
    assert_eq!(body["name"], Value::String("Renamed".to_string()));
    assert_eq!(body["is_admin"], Value::Bool(false));
}
