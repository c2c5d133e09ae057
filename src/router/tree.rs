//! Route tree and dispatcher.
//!
//! Routes are registered as a tree of path segments. Each node owns its method
//! handlers and middlewares; a node's full path is the concatenation of the
//! segments from its root. Middlewares attached to a node apply to the node
//! and all of its descendants, ancestors first.
//!
//! ```text
//! "/"            use(log_call)
//! ├── "auth"
//! │   └── "/login"   use(basic_auth)   POST
//! └── "api"          use(jwt_auth)
//!     └── "/todo"                       GET POST
//!         └── "/{id}"                   GET PUT PATCH DELETE
//! ```
//!
//! [`RouteTree::finalize`] walks each tree once and produces an axum
//! [`Router`] with one entry per concrete path. All misconfiguration
//! (duplicate methods, duplicate paths, empty leaves) surfaces there or at
//! registration as a [`RouteError`]; after finalize the table is immutable.
//!
//! # Example
//!
//! ```rust
//! use axum::http::StatusCode;
//! use axum::response::IntoResponse;
//! use check42::router::{Handler, RouteTree};
//!
//! let mut tree = RouteTree::new();
//! let base = tree.route("/");
//! let ping = tree.subroute(base, "ping").unwrap();
//! tree.on_get(ping, Handler::new(|_| async { StatusCode::OK.into_response() }))
//!     .unwrap();
//!
//! let router = tree.finalize(&[base]).unwrap();
//! # let _ = router;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tracing::info;

use super::handler::{Chain, Handler, Middleware};
use crate::error::RouteError;

/// Handle to a node of a [`RouteTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteId(usize);

struct RouteNode {
    path: String,
    handlers: HashMap<Method, Handler>,
    children: Vec<RouteId>,
    middlewares: Vec<Arc<dyn Middleware>>,
    registered: bool,
}

impl RouteNode {
    fn new(path: String) -> Self {
        Self {
            path,
            handlers: HashMap::new(),
            children: Vec::new(),
            middlewares: Vec::new(),
            registered: false,
        }
    }
}

/// Registration-phase route tree.
#[derive(Default)]
pub struct RouteTree {
    nodes: Vec<RouteNode>,
}

impl RouteTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new base route not attached to any parent.
    pub fn route(&mut self, path: impl Into<String>) -> RouteId {
        self.nodes.push(RouteNode::new(path.into()));
        RouteId(self.nodes.len() - 1)
    }

    /// Create a route under `parent`. Its full path is the parent's full
    /// path followed by `path`.
    pub fn subroute(
        &mut self,
        parent: RouteId,
        path: impl Into<String>,
    ) -> Result<RouteId, RouteError> {
        self.node(parent)?;
        let child = self.route(path);
        self.node_mut(parent)?.children.push(child);
        Ok(child)
    }

    /// Attach an existing route under `parent`.
    ///
    /// A route attached in more than one place is rejected by
    /// [`finalize`](Self::finalize).
    pub fn attach(&mut self, parent: RouteId, child: RouteId) -> Result<(), RouteError> {
        self.node(child)?;
        self.node_mut(parent)?.children.push(child);
        Ok(())
    }

    /// Bind `handler` to `method` on a route. Each method can be bound once.
    pub fn on(&mut self, id: RouteId, method: Method, handler: Handler) -> Result<(), RouteError> {
        let node = self.node_mut(id)?;
        if node.handlers.contains_key(&method) {
            return Err(RouteError::DuplicateMethod {
                method: method.to_string(),
                path: node.path.clone(),
            });
        }
        node.handlers.insert(method, handler);
        Ok(())
    }

    pub fn on_get(&mut self, id: RouteId, handler: Handler) -> Result<(), RouteError> {
        self.on(id, Method::GET, handler)
    }

    pub fn on_post(&mut self, id: RouteId, handler: Handler) -> Result<(), RouteError> {
        self.on(id, Method::POST, handler)
    }

    pub fn on_put(&mut self, id: RouteId, handler: Handler) -> Result<(), RouteError> {
        self.on(id, Method::PUT, handler)
    }

    pub fn on_patch(&mut self, id: RouteId, handler: Handler) -> Result<(), RouteError> {
        self.on(id, Method::PATCH, handler)
    }

    pub fn on_delete(&mut self, id: RouteId, handler: Handler) -> Result<(), RouteError> {
        self.on(id, Method::DELETE, handler)
    }

    /// Append a middleware to a route and, through it, to all its subroutes.
    ///
    /// Middlewares run in the order they were added.
    pub fn use_middleware(
        &mut self,
        id: RouteId,
        middleware: impl Middleware,
    ) -> Result<(), RouteError> {
        self.use_shared(id, Arc::new(middleware))
    }

    /// Like [`use_middleware`](Self::use_middleware) for an already shared middleware.
    pub fn use_shared(
        &mut self,
        id: RouteId,
        middleware: Arc<dyn Middleware>,
    ) -> Result<(), RouteError> {
        self.node_mut(id)?.middlewares.push(middleware);
        Ok(())
    }

    /// Walk every tree rooted at `roots` once and build the dispatch table.
    pub fn finalize(mut self, roots: &[RouteId]) -> Result<Router, RouteError> {
        let mut bindings = Vec::new();
        let mut seen = HashMap::new();
        for &root in roots {
            self.register(root, "", &[], &mut seen, &mut bindings)?;
        }

        let router = bindings
            .into_iter()
            .fold(Router::new(), |router, binding| {
                let dispatch = binding.dispatch;
                router.route(
                    &binding.path,
                    any(move |request: Request| {
                        let dispatch = dispatch.clone();
                        async move { dispatch.dispatch(request).await }
                    }),
                )
            });
        Ok(router)
    }

    fn register(
        &mut self,
        id: RouteId,
        prefix: &str,
        inherited: &[Arc<dyn Middleware>],
        seen: &mut HashMap<String, String>,
        bindings: &mut Vec<Binding>,
    ) -> Result<(), RouteError> {
        let node = self.node_mut(id)?;
        let full_path = format!("{}{}", prefix, node.path);

        if node.registered {
            return Err(RouteError::AlreadyRegistered { path: full_path });
        }
        node.registered = true;

        let mut effective = inherited.to_vec();
        effective.extend(node.middlewares.iter().cloned());

        if !node.handlers.is_empty() {
            check_path(&full_path)?;
            // paths differing only in capture names collide in the dispatch table
            if let Some(existing) = seen.insert(route_shape(&full_path), full_path.clone()) {
                return Err(if existing == full_path {
                    RouteError::DuplicatePath { path: full_path }
                } else {
                    RouteError::ConflictingPath {
                        path: full_path,
                        existing,
                    }
                });
            }

            let mut methods: Vec<&str> = node.handlers.keys().map(Method::as_str).collect();
            methods.sort_unstable();
            info!(path = %full_path, methods = %methods.join(" | "), "Registered route");

            let chains = node
                .handlers
                .iter()
                .map(|(method, handler)| {
                    (method.clone(), Chain::new(effective.clone(), handler.clone()))
                })
                .collect();
            bindings.push(Binding {
                path: full_path.clone(),
                dispatch: MethodDispatch {
                    chains: Arc::new(chains),
                    allow: methods.join(", "),
                },
            });
        } else if node.children.is_empty() {
            return Err(RouteError::EmptyRoute { path: full_path });
        }

        let children = node.children.clone();
        for child in children {
            self.register(child, &full_path, &effective, seen, bindings)?;
        }
        Ok(())
    }

    fn node(&self, id: RouteId) -> Result<&RouteNode, RouteError> {
        self.nodes.get(id.0).ok_or(RouteError::UnknownRoute(id.0))
    }

    fn node_mut(&mut self, id: RouteId) -> Result<&mut RouteNode, RouteError> {
        self.nodes.get_mut(id.0).ok_or(RouteError::UnknownRoute(id.0))
    }
}

/// Reject full paths the underlying router cannot bind.
fn check_path(path: &str) -> Result<(), RouteError> {
    let invalid = |reason| RouteError::InvalidPath {
        path: path.to_string(),
        reason,
    };
    if !path.starts_with('/') {
        return Err(invalid("must start with '/'"));
    }
    if path.contains('*') {
        return Err(invalid("wildcards are not supported"));
    }
    if path.split('/').any(|segment| segment.starts_with(':')) {
        return Err(invalid("captures are written as {name}"));
    }

    let mut names = Vec::new();
    let mut rest = path;
    while let Some(open) = rest.find(['{', '}']) {
        if rest[open..].starts_with('}') {
            return Err(invalid("unbalanced '}'"));
        }
        let Some(close) = rest[open..].find('}') else {
            return Err(invalid("unbalanced '{'"));
        };
        let name = &rest[open + 1..open + close];
        if name.is_empty() || name.contains(['{', '/']) {
            return Err(invalid("capture names must be non-empty words"));
        }
        if names.contains(&name) {
            return Err(invalid("capture names must be unique"));
        }
        names.push(name);
        rest = &rest[open + close + 1..];
    }
    Ok(())
}

/// `path` with every capture name erased, e.g. `/todo/{id}` -> `/todo/{}`.
fn route_shape(path: &str) -> String {
    let mut shape = String::with_capacity(path.len());
    let mut in_capture = false;
    for c in path.chars() {
        match c {
            '{' => {
                in_capture = true;
                shape.push(c);
            }
            '}' => {
                in_capture = false;
                shape.push(c);
            }
            _ if in_capture => {}
            _ => shape.push(c),
        }
    }
    shape
}

struct Binding {
    path: String,
    dispatch: MethodDispatch,
}

/// Per-path method table.
#[derive(Clone)]
struct MethodDispatch {
    chains: Arc<HashMap<Method, Chain>>,
    allow: String,
}

impl MethodDispatch {
    async fn dispatch(&self, request: Request) -> Response {
        match self.chains.get(request.method()) {
            Some(chain) => chain.run(request).await,
            None => {
                let mut response = StatusCode::METHOD_NOT_ALLOWED.into_response();
                if let Ok(allow) = HeaderValue::from_str(&self.allow) {
                    response.headers_mut().insert(header::ALLOW, allow);
                }
                response
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
