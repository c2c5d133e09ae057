//! # check42
//!
//! A small multi-user to-do list web service.
//!
//! Users register, log in with basic credentials to receive a signed session
//! cookie, and manage personal todos organized into categories.
//!
//! ## Features
//!
//! - **Route tree**: nested path registration with per-method handlers and
//!   middlewares inherited by every subroute, checked once at startup
//! - **Authentication**: basic auth against argon2 password hashes, and
//!   HMAC-SHA256 signed session tokens carried in an `HttpOnly` cookie
//! - **Typed handlers**: handlers return a value and an [`HttpStatus`]; the
//!   router renders JSON, bare statuses, or validation hints
//! - **Storage**: MySQL through `sqlx`, or an in-memory store
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`router`] - Route tree, dispatcher, middlewares and response rendering
//! - [`auth`] - Token codec, password hashing and credential validation
//! - [`model`] - Users, todos and categories
//! - [`store`] - Storage traits with in-memory and MySQL backends
//! - [`api`] - The HTTP API built on the route tree
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use check42::{create_router, AuthConfig, MemoryStore, RouterConfig, Server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(MemoryStore::new());
//!     let server = Server::new(store.clone(), store, AuthConfig::new("change-me"));
//!     let router = create_router(Arc::new(server), RouterConfig::new())
//!         .expect("route table is consistent");
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod model;
pub mod router;
pub mod store;

// Re-export commonly used types
pub use api::{create_router, ErrorResponse, HealthResponse, RouterConfig, Server};
pub use auth::{ApiAuthority, AuthConfig, SaltedHasher, TokenCodec, DEFAULT_TOKEN_TTL};
pub use config::Config;
pub use error::{PasswordError, RouteError, StoreError, TokenError};
pub use model::{CreateTodo, CreateUser, NewUser, Todo, TodoCategory, User};
pub use router::{
    basic_auth, claims, jwt_auth, log_call, proc, proc_empty, Authority, Claims, Handler,
    HttpStatus, Middleware, RouteTree, Scheme, ValidationErrors,
};
pub use store::{MemoryStore, MySqlStore, TodoStore, UserStore};
