//! Test utilities for integration tests.
//!
//! [`TestApp`] wraps a router over a fresh [`MemoryStore`] with cheap password
//! hashing, plus helpers for building requests and reading responses.

use std::sync::Arc;

use argon2::Params;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use base64::{engine::general_purpose::STANDARD, Engine};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use check42::store::UserStore;
use check42::{create_router, AuthConfig, MemoryStore, RouterConfig, Server};

pub const TEST_SECRET: &str = "test-secret-key-for-session-tokens";

pub const TEST_PASSWORD: &str = "correct horse battery";

// =============================================================================
// Application Harness
// =============================================================================

/// A router plus a handle on its backing store.
pub struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        let params = Params::new(Params::MIN_M_COST, 1, 1, None).unwrap();
        let auth = AuthConfig::new(TEST_SECRET)
            .with_password_salt("pepper")
            .with_hash_params(params);

        let store = Arc::new(MemoryStore::new());
        let server = Server::new(store.clone(), store.clone(), auth);
        let router = create_router(Arc::new(server), RouterConfig::new().with_tracing(false))
            .expect("route table should be consistent");

        Self { router, store }
    }

    /// Send one request through a clone of the router.
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Id the store assigned to `name`.
    pub async fn user_id(&self, name: &str) -> i64 {
        self.store.get_user_by_name(name).await.unwrap().id
    }

    /// `POST /auth/signin` with the given fields.
    pub async fn signup(&self, name: &str, email: &str, password: &str) -> Response {
        let body = json!({ "name": name, "email": email, "password": password });
        self.send(json_request(Method::POST, "/auth/signin", None, body))
            .await
    }

    /// `POST /auth/login` with basic credentials.
    pub async fn login(&self, name: &str, password: &str) -> Response {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/auth/login")
            .header(header::AUTHORIZATION, basic(name, password))
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Create `name` with [`TEST_PASSWORD`], log in, and return the
    /// `jwt=<token>` pair to send back as a cookie.
    pub async fn register_and_login(&self, name: &str) -> String {
        let email = format!("{name}@example.com");
        let response = self.signup(name, &email, TEST_PASSWORD).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = self.login(name, TEST_PASSWORD).await;
        assert_eq!(response.status(), StatusCode::OK);
        session_cookie(&response).expect("login should set the session cookie")
    }

    /// `POST /api/todo`, returning the new id.
    pub async fn create_todo(&self, cookie: &str, text: &str, category: i64) -> i64 {
        let body = json!({ "text": text, "done": false, "category": { "id": category } });
        let response = self
            .send(json_request(Method::POST, "/api/todo", Some(cookie), body))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await.as_i64().unwrap()
    }

    /// `POST /api/todo/category?name=...`, returning the new id.
    pub async fn create_category(&self, cookie: &str, name: &str) -> i64 {
        let uri = format!("/api/todo/category?name={name}");
        let response = self.send(request(Method::POST, &uri, Some(cookie))).await;
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await.as_i64().unwrap()
    }
}

// =============================================================================
// Request Builders
// =============================================================================

/// `Authorization` value for basic credentials.
pub fn basic(name: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{name}:{password}")))
}

/// A request without a body, optionally carrying a cookie.
pub fn request(method: Method, uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

/// A request with a JSON body, optionally carrying a cookie.
pub fn json_request(method: Method, uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

// =============================================================================
// Response Helpers
// =============================================================================

/// The `jwt=<token>` pair from the response's `Set-Cookie` header.
pub fn session_cookie(response: &Response) -> Option<String> {
    let value = response.headers().get(header::SET_COOKIE)?.to_str().ok()?;
    let pair = value.split(';').next()?.trim();
    pair.starts_with("jwt=").then(|| pair.to_string())
}

/// Raw `Set-Cookie` header value.
pub fn set_cookie_header(response: &Response) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("response should set a cookie")
        .to_str()
        .unwrap()
        .to_string()
}

pub async fn body_string(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
