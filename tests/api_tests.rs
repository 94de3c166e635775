//! API tests against a running server
//!
//! Start the server (and its PostgreSQL and Redis dependencies), then run
//! `cargo test -- --ignored`. The workflow test also needs an activated
//! admin account given by `LIBRARY_TEST_ADMIN_EMAIL` and
//! `LIBRARY_TEST_ADMIN_PASSWORD`.

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

fn base_url() -> String {
    std::env::var("LIBRARY_TEST_URL").unwrap_or_else(|_| "http://localhost:8080/api/v1".into())
}

/// Login with the admin account from the environment, if configured
async fn admin_token(client: &Client) -> Option<String> {
    let email = std::env::var("LIBRARY_TEST_ADMIN_EMAIL").ok()?;
    let password = std::env::var("LIBRARY_TEST_ADMIN_PASSWORD").ok()?;

    let response = client
        .post(format!("{}/auth/login", base_url()))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to send login request");
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.expect("Failed to parse login response");
    Some(body["token"].as_str().expect("No token in response").to_string())
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", base_url()))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_borrow_without_token() {
    let client = Client::new();

    let response = client
        .post(format!("{}/borrow", base_url()))
        .json(&json!({ "memberCode": "M001", "bookCodes": ["B001"] }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_register_rejects_weak_password() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/register", base_url()))
        .json(&json!({
            "name": "Abdul Talif",
            "email": "abdultalif@gmail.com",
            "password": "talif",
            "confirmPassword": "talif"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "BadValue");
}

#[tokio::test]
#[ignore]
async fn test_login_with_wrong_password() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", base_url()))
        .json(&json!({ "email": "nobody@example.com", "password": "Wrong123!" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["message"], "Email or Password is wrong");
}

#[tokio::test]
#[ignore]
async fn test_admin_borrow_and_return() {
    let client = Client::new();
    let Some(token) = admin_token(&client).await else {
        eprintln!("LIBRARY_TEST_ADMIN_EMAIL not set, skipping");
        return;
    };

    let suffix = chrono::Utc::now().timestamp_millis();
    let response = client
        .post(format!("{}/books", base_url()))
        .bearer_auth(&token)
        .json(&json!({
            "title": format!("Workflow Test {}", suffix),
            "author": "Test Author",
            "stock": 1
        }))
        .send()
        .await
        .expect("Failed to create book");
    assert_eq!(response.status(), StatusCode::CREATED);
    let book: Value = response.json().await.expect("Failed to parse book");
    let book_code = book["code"].as_str().expect("No code").to_string();

    let response = client
        .get(format!("{}/members", base_url()))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to list members");
    let members: Value = response.json().await.expect("Failed to parse members");
    let member = members
        .as_array()
        .and_then(|list| {
            list.iter().find(|m| {
                m["borrowedBooks"].as_array().map_or(false, Vec::is_empty)
                    && m["penaltyUntil"].is_null()
            })
        })
        .expect("No member free to borrow");
    let member_code = member["code"].as_str().expect("No code").to_string();

    let loan = json!({ "memberCode": member_code, "bookCodes": [book_code] });

    let response = client
        .post(format!("{}/borrow", base_url()))
        .bearer_auth(&token)
        .json(&loan)
        .send()
        .await
        .expect("Failed to borrow");
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .get(format!("{}/books/{}", base_url(), book_code))
        .send()
        .await
        .expect("Failed to fetch book");
    let fetched: Value = response.json().await.expect("Failed to parse book");
    assert_eq!(fetched["stock"], 0);

    let response = client
        .post(format!("{}/return", base_url()))
        .bearer_auth(&token)
        .json(&loan)
        .send()
        .await
        .expect("Failed to return");
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(
        body["message"],
        format!("Books returned successfully: {}", book_code)
    );

    client
        .delete(format!("{}/books/{}", base_url(), book_code))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to delete book");
}
