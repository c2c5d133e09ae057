//! Lightweight request routing on top of axum.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          RouteTree                              │
//! │   route / subroute / on(method) / use_middleware  ──finalize──▶ │
//! │                                                   axum::Router  │
//! │                                                                 │
//! │  ┌─────────────┐  ┌──────────────┐  ┌────────────────────────┐  │
//! │  │   handler   │  │  middleware  │  │        process         │  │
//! │  │ (chain,next)│  │ (auth, log)  │  │ (HttpStatus -> wire)   │  │
//! │  └─────────────┘  └──────────────┘  └────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handler;
pub mod middleware;
pub mod process;
pub mod tree;
pub mod validation;

pub use handler::{from_fn, BoxFuture, FromFn, Handler, Middleware, Next};
pub use middleware::{
    basic_auth, claims, jwt_auth, log_call, Authenticate, Authority, Claims, Scheme,
    UnsupportedScheme, JWT_COOKIE,
};
pub use process::{proc, proc_empty, BoxError, Cause, HttpStatus};
pub use tree::{RouteId, RouteTree};
pub use validation::{Hint, ValidationErrors};
