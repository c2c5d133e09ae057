//! HTTP API of the to-do service.
//!
//! # Route Structure
//!
//! ```text
//! /health                        GET                        public
//! /auth/signin                   POST                       public
//! /auth/login                    POST                       basic auth
//! /auth/logout                   POST                       public
//! /api/todo                      GET POST                   jwt cookie
//! /api/todo/{id}                 GET PUT PATCH DELETE       jwt cookie
//! /api/todo/category             GET POST                   jwt cookie
//! /api/todo/category/{id}        PATCH DELETE               jwt cookie
//! ```
//!
//! Every route logs its calls through `log_call`, attached at the root.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use check42::api::{create_router, RouterConfig, Server};
//! use check42::auth::AuthConfig;
//! use check42::store::MemoryStore;
//!
//! let store = Arc::new(MemoryStore::new());
//! let server = Server::new(store.clone(), store, AuthConfig::new("secret"));
//! let router = create_router(Arc::new(server), RouterConfig::new())?;
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, router).await?;
//! ```

mod auth;
mod category;
mod errors;
mod todo;

pub use errors::ErrorResponse;

use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::Request,
    response::{IntoResponse, Response},
    Json, Router,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::auth::{ApiAuthority, AuthConfig, SaltedHasher, TokenCodec};
use crate::error::RouteError;
use crate::router::{
    basic_auth, jwt_auth, log_call, proc, proc_empty, Authority, Handler, HttpStatus, RouteTree,
};
use crate::store::{TodoStore, UserStore};
use errors::{respond, respond_empty, Outcome};

// =============================================================================
// Server State
// =============================================================================

/// Shared state handed to every handler.
pub struct Server {
    users: Arc<dyn UserStore>,
    todos: Arc<dyn TodoStore>,
    auth: AuthConfig,
    tokens: TokenCodec,
    hasher: SaltedHasher,
}

impl Server {
    pub fn new(users: Arc<dyn UserStore>, todos: Arc<dyn TodoStore>, auth: AuthConfig) -> Self {
        Self {
            tokens: auth.token_codec(),
            hasher: auth.hasher(),
            users,
            todos,
            auth,
        }
    }

    /// Credential validator backed by this server's user store and keys.
    pub fn authority(&self) -> ApiAuthority {
        ApiAuthority::new(
            Arc::clone(&self.users),
            self.tokens.clone(),
            self.hasher.clone(),
        )
    }
}

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Tracing enabled.
    pub fn new() -> Self {
        Self {
            enable_tracing: true,
        }
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Build the route tree and finalize it into an axum router.
///
/// # Errors
///
/// A [`RouteError`] if the route table is inconsistent. The caller must not
/// serve in that case.
pub fn create_router(server: Arc<Server>, config: RouterConfig) -> Result<Router, RouteError> {
    let authority: Arc<dyn Authority> = Arc::new(server.authority());
    let mut tree = RouteTree::new();

    let base = tree.route("/");
    tree.use_middleware(base, log_call())?;

    let health = tree.subroute(base, "health")?;
    tree.on_get(health, Handler::new(|_| health_handler()))?;

    // accounts
    let accounts = tree.subroute(base, "auth")?;
    let signin = tree.subroute(accounts, "/signin")?;
    let login = tree.subroute(accounts, "/login")?;
    let logout = tree.subroute(accounts, "/logout")?;

    tree.use_middleware(login, basic_auth(Arc::clone(&authority)))?;

    tree.on_post(signin, raw(&server, auth::signin))?;
    tree.on_post(login, raw(&server, auth::login))?;
    tree.on_post(logout, raw(&server, auth::logout))?;

    // todos and categories
    let api = tree.subroute(base, "api")?;
    let todos = tree.subroute(api, "/todo")?;
    let todo_id = tree.subroute(todos, "/{id}")?;
    let categories = tree.subroute(todos, "/category")?;
    let category_id = tree.subroute(categories, "/{id}")?;

    tree.use_middleware(api, jwt_auth(authority))?;

    tree.on_get(todos, typed(&server, HttpStatus::ok, todo::get_all))?;
    tree.on_post(todos, typed(&server, HttpStatus::created, todo::create))?;

    tree.on_get(todo_id, typed(&server, HttpStatus::ok, todo::get_one))?;
    tree.on_put(todo_id, empty(&server, todo::replace))?;
    tree.on_patch(todo_id, empty(&server, todo::patch))?;
    tree.on_delete(todo_id, empty(&server, todo::delete))?;

    tree.on_get(categories, typed(&server, HttpStatus::ok, category::get_all))?;
    tree.on_post(categories, typed(&server, HttpStatus::ok, category::create))?;

    tree.on_patch(category_id, empty(&server, category::rename))?;
    tree.on_delete(category_id, empty(&server, category::delete))?;

    let router = tree.finalize(&[base])?;

    // Add tracing if enabled
    Ok(if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    })
}

// =============================================================================
// Handler binding
// =============================================================================

/// Bind a handler that writes its own response.
fn raw<F, Fut>(server: &Arc<Server>, f: F) -> Handler
where
    F: Fn(Arc<Server>, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    let server = Arc::clone(server);
    Handler::new(move |request| f(Arc::clone(&server), request))
}

/// Bind a handler producing a JSON body, answered with `success()` when it
/// succeeds.
fn typed<T, F, Fut>(server: &Arc<Server>, success: fn() -> HttpStatus, f: F) -> Handler
where
    T: Serialize + Send + 'static,
    F: Fn(Arc<Server>, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Outcome<T>> + Send + 'static,
{
    let server = Arc::clone(server);
    proc(move |request| {
        let outcome = f(Arc::clone(&server), request);
        async move { respond(outcome.await, success()) }
    })
}

/// Bind a handler without a response body.
fn empty<F, Fut>(server: &Arc<Server>, f: F) -> Handler
where
    F: Fn(Arc<Server>, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Outcome<()>> + Send + 'static,
{
    let server = Arc::clone(server);
    proc_empty(move |request| {
        let outcome = f(Arc::clone(&server), request);
        async move { respond_empty(outcome.await) }
    })
}

// =============================================================================
// Health
// =============================================================================

/// Response from the health check endpoint.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
async fn health_handler() -> Response {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
    .into_response()
}
