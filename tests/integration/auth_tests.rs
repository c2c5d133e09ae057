//! Account and session integration tests.
//!
//! Tests verify:
//! - Sign-up validation hints and duplicate detection
//! - Basic-auth login and the session cookie it sets
//! - Expired, forged and foreign-key tokens are rejected
//! - Logout replaces the cookie with an expired one

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::json;

use check42::{Claims, TokenCodec};

use super::test_utils::{
    basic, body_json, body_string, json_request, request, session_cookie, set_cookie_header,
    TestApp, TEST_PASSWORD, TEST_SECRET,
};

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

// =============================================================================
// Sign-up
// =============================================================================

#[tokio::test]
async fn test_signup_creates_account() {
    let app = TestApp::new();

    let response = app
        .signup("ada", "ada@example.com", TEST_PASSWORD)
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(body_string(response).await.is_empty());

    assert!(app.user_id("ada").await > 0);
}

#[tokio::test]
async fn test_signup_empty_name_lists_hint() {
    let app = TestApp::new();

    let response = app.signup("", "ada@example.com", TEST_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_string(response).await;
    assert!(body.starts_with("validation errors found:"));
    assert!(body.contains("- field 'name' is left empty"));
}

#[tokio::test]
async fn test_signup_reports_every_failing_field() {
    let app = TestApp::new();

    let response = app.signup("ada", "not-an-email", "short").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_string(response).await;
    assert!(body.contains("- field 'email' has incorrect format"));
    assert!(body.contains("- field 'password' should be at least 8 characters long"));
    assert!(!body.contains("'name'"));
}

#[tokio::test]
async fn test_signup_missing_fields_are_empty() {
    let app = TestApp::new();

    let response = app
        .send(json_request(Method::POST, "/auth/signin", None, json!({})))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_string(response).await;
    assert!(body.contains("- field 'name' is left empty"));
    assert!(body.contains("- field 'email' is left empty"));
}

#[tokio::test]
async fn test_signup_unreadable_body() {
    let app = TestApp::new();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/auth/signin")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "could not read user" })
    );
}

#[tokio::test]
async fn test_signup_duplicate_name() {
    let app = TestApp::new();
    app.signup("ada", "ada@example.com", TEST_PASSWORD).await;

    let response = app
        .signup("ada", "other@example.com", TEST_PASSWORD)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "username is already taken" })
    );
}

#[tokio::test]
async fn test_signup_duplicate_email() {
    let app = TestApp::new();
    app.signup("ada", "ada@example.com", TEST_PASSWORD).await;

    let response = app
        .signup("grace", "ada@example.com", TEST_PASSWORD)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("email"));
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn test_login_sets_session_cookie() {
    let app = TestApp::new();
    app.signup("ada", "ada@example.com", TEST_PASSWORD).await;

    let response = app.login("ada", TEST_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = set_cookie_header(&response);
    assert!(cookie.starts_with("jwt="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Max-Age=604800"));

    // The token names the logged-in user
    let token = session_cookie(&response).unwrap();
    let token = token.trim_start_matches("jwt=");
    let claims = TokenCodec::new(TEST_SECRET).verify(token).unwrap();
    assert_eq!(claims.id, app.user_id("ada").await);
    assert_eq!(claims.name, "ada");
}

#[tokio::test]
async fn test_login_wrong_password() {
    let app = TestApp::new();
    app.signup("ada", "ada@example.com", TEST_PASSWORD).await;

    let response = app.login("ada", "wrong password").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_login_unknown_user() {
    let app = TestApp::new();

    let response = app.login("nobody", TEST_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_without_credentials() {
    let app = TestApp::new();

    let response = app.send(request(Method::POST, "/auth/login", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_malformed_authorization() {
    let app = TestApp::new();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/auth/login")
        .header(header::AUTHORIZATION, "Basic")
        .body(Body::empty())
        .unwrap();

    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_tries_each_authorization_value() {
    let app = TestApp::new();
    app.signup("ada", "ada@example.com", TEST_PASSWORD).await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/auth/login")
        .header(header::AUTHORIZATION, basic("ada", "wrong password"))
        .header(header::AUTHORIZATION, basic("ada", TEST_PASSWORD))
        .body(Body::empty())
        .unwrap();

    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Session Cookies
// =============================================================================

#[tokio::test]
async fn test_session_cookie_grants_access() {
    let app = TestApp::new();
    let cookie = app.register_and_login("ada").await;

    let response = app
        .send(request(Method::GET, "/api/todo", Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let app = TestApp::new();
    app.register_and_login("ada").await;

    let claims = Claims {
        id: app.user_id("ada").await,
        name: "ada".to_string(),
    };
    let token = TokenCodec::new(TEST_SECRET)
        .issue_with_expiry(&claims, now() - 60)
        .unwrap();

    let cookie = format!("jwt={token}");
    let response = app
        .send(request(Method::GET, "/api/todo", Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_from_other_key_rejected() {
    let app = TestApp::new();
    app.register_and_login("ada").await;

    let claims = Claims {
        id: app.user_id("ada").await,
        name: "ada".to_string(),
    };
    let token = TokenCodec::new("some-other-secret")
        .issue(&claims, Duration::from_secs(3600))
        .unwrap();

    let cookie = format!("jwt={token}");
    let response = app
        .send(request(Method::GET, "/api/todo", Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_garbage_token_rejected() {
    let app = TestApp::new();

    let response = app
        .send(request(Method::GET, "/api/todo", Some("jwt=not.a.token")))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_in_authorization_header_ignored() {
    let app = TestApp::new();
    let cookie = app.register_and_login("ada").await;
    let token = cookie.trim_start_matches("jwt=");

    let request = Request::builder()
        .uri("/api/todo")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();

    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Logout
// =============================================================================

#[tokio::test]
async fn test_logout_expires_cookie() {
    let app = TestApp::new();

    let response = app.send(request(Method::POST, "/auth/logout", None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = set_cookie_header(&response);
    assert!(cookie.starts_with("jwt=;"));
    assert!(cookie.contains("Max-Age=0"));
    assert!(cookie.contains("Expires=Thu, 01 Jan 1970 00:00:00 GMT"));
}
