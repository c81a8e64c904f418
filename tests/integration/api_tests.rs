//! API integration tests
//!
//! Run against a live server wired to a real backend project:
//! `BOOKSHELF_TEST_EMAIL=... BOOKSHELF_TEST_PASSWORD=... cargo test -- --ignored`

use reqwest::{header, redirect::Policy, Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:3000";

fn client() -> Client {
    Client::builder()
        .redirect(Policy::none())
        .build()
        .expect("Failed to build client")
}

fn credentials() -> (String, String) {
    (
        std::env::var("BOOKSHELF_TEST_EMAIL").expect("BOOKSHELF_TEST_EMAIL not set"),
        std::env::var("BOOKSHELF_TEST_PASSWORD").expect("BOOKSHELF_TEST_PASSWORD not set"),
    )
}

/// Sign in and return the `name=value` pair of the session cookie
async fn session_cookie(client: &Client) -> String {
    let (email, password) = credentials();
    let response = client
        .post(format!("{}/api/user/login", BASE_URL))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to send login request");

    assert!(response.status().is_success());
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .expect("No session cookie in response");
    set_cookie
        .split(';')
        .next()
        .expect("Malformed Set-Cookie header")
        .to_string()
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let response = client()
        .get(format!("{}/api/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let response = client()
        .post(format!("{}/api/user/login", BASE_URL))
        .json(&json!({ "email": "nobody@library.test", "password": "wrong" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "InvalidCredentials");
}

#[tokio::test]
#[ignore]
async fn test_dashboard_requires_session() {
    let response = client()
        .get(format!("{}/dashboard/booksManagement/list", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()[header::LOCATION], "/user/login");
}

#[tokio::test]
#[ignore]
async fn test_login_page_redirects_signed_in_user() {
    let client = client();
    let cookie = session_cookie(&client).await;

    let response = client
        .get(format!("{}/user/login", BASE_URL))
        .header(header::COOKIE, &cookie)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()[header::LOCATION], "/dashboard");
}

#[tokio::test]
#[ignore]
async fn test_list_books() {
    let client = client();
    let cookie = session_cookie(&client).await;

    let response = client
        .post(format!("{}/api/book/getList", BASE_URL))
        .header(header::COOKIE, &cookie)
        .json(&json!({ "page": 1, "pageSize": 5 }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["data"].is_array());
    assert_eq!(body["pagination"]["pageSize"], 5);
}

#[tokio::test]
#[ignore]
async fn test_book_lifecycle() {
    let client = client();
    let cookie = session_cookie(&client).await;
    let isbn = format!("978{:010}", chrono::Utc::now().timestamp() % 10_000_000_000);

    // Add
    let response = client
        .post(format!("{}/api/book", BASE_URL))
        .header(header::COOKIE, &cookie)
        .json(&json!({
            "title": "Integration Test Book",
            "author": "Test Author",
            "isbn": isbn,
            "category": "Testing"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    let id = body["data"]["id"].as_str().expect("No id in response").to_string();

    // Same ISBN again
    let response = client
        .post(format!("{}/api/book/add", BASE_URL))
        .header(header::COOKIE, &cookie)
        .json(&json!({
            "title": "Integration Test Book",
            "author": "Test Author",
            "isbn": isbn,
            "category": "Testing"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Update
    let response = client
        .put(format!("{}/api/book", BASE_URL))
        .header(header::COOKIE, &cookie)
        .json(&json!({
            "id": id,
            "title": "Integration Test Book (2nd ed.)",
            "author": "Test Author",
            "isbn": isbn,
            "category": "Testing",
            "quantity": 3,
            "status": 0
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["quantity"], 3);
    assert_eq!(body["data"]["status"], 0);

    // Delete
    let response = client
        .delete(format!("{}/api/book", BASE_URL))
        .header(header::COOKIE, &cookie)
        .json(&json!({ "id": id }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    // Already gone
    let response = client
        .post(format!("{}/api/book/delete", BASE_URL))
        .header(header::COOKIE, &cookie)
        .json(&json!({ "id": id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_logout_clears_cookie() {
    let client = client();
    let cookie = session_cookie(&client).await;

    let response = client
        .post(format!("{}/api/user/logout", BASE_URL))
        .header(header::COOKIE, &cookie)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.contains("Max-Age=0"));
}
