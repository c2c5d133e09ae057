//! Handlers, middlewares and the chain that connects them.
//!
//! A [`Handler`] turns a request into a response. A [`Middleware`] sits in
//! front of a handler and decides per request whether to forward to the rest
//! of the chain (via [`Next::run`]) or to answer itself. Rejecting is just
//! returning a response without calling `next`.
//!
//! ```text
//! request ─▶ mw[0] ─▶ mw[1] ─▶ ... ─▶ handler
//!              │         │
//!              └─────────┴──▶ early response (chain stops)
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{extract::Request, response::Response};

/// Boxed, sendable future used at the handler seam.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

// =============================================================================
// Handler
// =============================================================================

/// A terminal request handler.
///
/// Cheap to clone; the underlying function is shared.
#[derive(Clone)]
pub struct Handler {
    inner: Arc<dyn Fn(Request) -> BoxFuture<Response> + Send + Sync>,
}

impl Handler {
    /// Wrap an async function taking the request and producing a response.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        Self {
            inner: Arc::new(move |request| -> BoxFuture<Response> { Box::pin(f(request)) }),
        }
    }

    /// Invoke the handler.
    pub async fn call(&self, request: Request) -> Response {
        (self.inner)(request).await
    }
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Handler")
    }
}

// =============================================================================
// Middleware
// =============================================================================

/// A request-intercepting stage.
///
/// Implementations either call `next.run(request)` to continue (possibly after
/// attaching data to the request extensions) or return their own response to
/// short-circuit the chain.
#[async_trait]
pub trait Middleware: Send + Sync + 'static {
    async fn handle(&self, request: Request, next: Next) -> Response;
}

/// Middleware built from an async closure, see [`from_fn`].
pub struct FromFn<F> {
    f: F,
}

/// Build a middleware from an async function `(Request, Next) -> Response`.
///
/// ```ignore
/// let mw = from_fn(|request, next: Next| async move {
///     tracing::info!("before");
///     next.run(request).await
/// });
/// ```
pub fn from_fn<F, Fut>(f: F) -> FromFn<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    FromFn { f }
}

#[async_trait]
impl<F, Fut> Middleware for FromFn<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    async fn handle(&self, request: Request, next: Next) -> Response {
        (self.f)(request, next).await
    }
}

// =============================================================================
// Chain
// =============================================================================

/// The remainder of a middleware chain, handed to each middleware.
pub struct Next {
    middlewares: Arc<[Arc<dyn Middleware>]>,
    position: usize,
    endpoint: Handler,
}

impl Next {
    /// Continue with the next middleware, or the endpoint once all have run.
    pub async fn run(self, request: Request) -> Response {
        match self.middlewares.get(self.position).cloned() {
            Some(middleware) => {
                let next = Next {
                    middlewares: Arc::clone(&self.middlewares),
                    position: self.position + 1,
                    endpoint: self.endpoint,
                };
                middleware.handle(request, next).await
            }
            None => self.endpoint.call(request).await,
        }
    }
}

/// A fully composed chain: middlewares in execution order, then the endpoint.
#[derive(Clone)]
pub(crate) struct Chain {
    middlewares: Arc<[Arc<dyn Middleware>]>,
    endpoint: Handler,
}

impl Chain {
    /// Compose `middlewares` (outermost first) in front of `endpoint`.
    pub(crate) fn new(middlewares: Vec<Arc<dyn Middleware>>, endpoint: Handler) -> Self {
        Self {
            middlewares: middlewares.into(),
            endpoint,
        }
    }

    pub(crate) async fn run(&self, request: Request) -> Response {
        Next {
            middlewares: Arc::clone(&self.middlewares),
            position: 0,
            endpoint: self.endpoint.clone(),
        }
        .run(request)
        .await
    }
}

// =============================================================================
// Tests
// =============================================================================
