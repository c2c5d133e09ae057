//! Adapting typed handlers to wire handlers.
//!
//! Handlers written against [`proc`] and [`proc_empty`] return a value and an
//! [`HttpStatus`] instead of building a response themselves. The wrapper
//! decides how the outcome is rendered:
//!
//! - status >= 400: bare status, except validation failures, which also get
//!   the rendered [`ValidationErrors`] as a plain-text body
//! - status < 400 with a body: the value serialized as JSON
//! - status < 400 without a body: bare status

use std::future::Future;

use axum::{
    extract::Request,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error};

use super::handler::Handler;
use super::validation::ValidationErrors;

/// Boxed error for non-validation causes.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Why a request failed.
#[derive(Debug)]
pub enum Cause {
    /// Field validation failed; rendered to the client
    Validation(ValidationErrors),
    /// Anything else; logged, never rendered
    Other(BoxError),
}

impl std::fmt::Display for Cause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cause::Validation(errors) => write!(f, "{}", errors.to_string().trim_end()),
            Cause::Other(err) => write!(f, "{}", err),
        }
    }
}

/// Outcome of a typed handler.
#[derive(Debug)]
pub struct HttpStatus {
    pub code: StatusCode,
    pub cause: Option<Cause>,
}

impl HttpStatus {
    pub fn new(code: StatusCode) -> Self {
        Self { code, cause: None }
    }

    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    pub fn created() -> Self {
        Self::new(StatusCode::CREATED)
    }

    /// Failed with an arbitrary cause.
    pub fn with_cause(code: StatusCode, cause: impl Into<BoxError>) -> Self {
        Self {
            code,
            cause: Some(Cause::Other(cause.into())),
        }
    }

    /// 400 carrying validation hints for the client.
    pub fn validation(errors: ValidationErrors) -> Self {
        Self {
            code: StatusCode::BAD_REQUEST,
            cause: Some(Cause::Validation(errors)),
        }
    }

    pub fn bad_request(cause: impl Into<BoxError>) -> Self {
        Self::with_cause(StatusCode::BAD_REQUEST, cause)
    }

    pub fn unauthorized(cause: impl Into<BoxError>) -> Self {
        Self::with_cause(StatusCode::UNAUTHORIZED, cause)
    }

    pub fn not_found(cause: impl Into<BoxError>) -> Self {
        Self::with_cause(StatusCode::NOT_FOUND, cause)
    }

    pub fn internal(cause: impl Into<BoxError>) -> Self {
        Self::with_cause(StatusCode::INTERNAL_SERVER_ERROR, cause)
    }

    pub fn is_error(&self) -> bool {
        self.code.as_u16() >= 400
    }
}

impl From<ValidationErrors> for HttpStatus {
    fn from(errors: ValidationErrors) -> Self {
        Self::validation(errors)
    }
}

/// The bare status, plus the rendered hints for validation failures.
///
/// Does not log; [`proc`] and [`proc_empty`] log before converting.
impl IntoResponse for HttpStatus {
    fn into_response(self) -> Response {
        let is_error = self.is_error();
        match self.cause {
            Some(Cause::Validation(errors)) if is_error => (
                self.code,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                errors.to_string(),
            )
                .into_response(),
            _ => self.code.into_response(),
        }
    }
}

/// Wrap a handler returning `(T, HttpStatus)`; `T` is written as JSON on success.
pub fn proc<T, F, Fut>(f: F) -> Handler
where
    T: Serialize + Send + 'static,
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (T, HttpStatus)> + Send + 'static,
{
    let f = std::sync::Arc::new(f);
    Handler::new(move |request: Request| {
        let f = std::sync::Arc::clone(&f);
        async move {
            let uri = request.uri().clone();
            let (result, status) = f(request).await;
            render(&uri, Some(result), status)
        }
    })
}

/// Wrap a handler returning only an [`HttpStatus`]; no body is written on success.
pub fn proc_empty<F, Fut>(f: F) -> Handler
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HttpStatus> + Send + 'static,
{
    let f = std::sync::Arc::new(f);
    Handler::new(move |request: Request| {
        let f = std::sync::Arc::clone(&f);
        async move {
            let uri = request.uri().clone();
            let status = f(request).await;
            render::<()>(&uri, None, status)
        }
    })
}

fn render<T: Serialize>(uri: &http::Uri, body: Option<T>, status: HttpStatus) -> Response {
    let code = status.code;
    if status.is_error() {
        match &status.cause {
            Some(cause) if code.is_server_error() => {
                error!(status = code.as_u16(), uri = %uri, "Request failed: {}", cause)
            }
            Some(cause) => debug!(status = code.as_u16(), uri = %uri, "Request failed: {}", cause),
            None => debug!(status = code.as_u16(), uri = %uri, "Request failed"),
        }
        return status.into_response();
    }

    match body {
        Some(value) => (code, Json(value)).into_response(),
        None => status.into_response(),
    }
}
