//! Shared plumbing for API handlers: request decoding and failure mapping.
//!
//! Handler bodies are written against [`Outcome`] so they can use `?`; the
//! [`respond`] helpers turn the result into the `(value, HttpStatus)` pair the
//! router's processing wrapper expects.

use axum::{
    extract::{FromRequest, Path, Query, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, RequestExt,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::error;

use crate::error::StoreError;
use crate::router::{claims, Claims, HttpStatus};

/// Intermediate result of a handler body.
pub(crate) type Outcome<T> = Result<T, HttpStatus>;

/// JSON error body written by the raw auth handlers.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Write `{"error": message}` with `status`.
pub(crate) fn fail(status: StatusCode, message: impl Into<String>) -> Response {
    let body = ErrorResponse {
        error: message.into(),
    };
    (status, Json(body)).into_response()
}

/// Log `cause` and answer with a generic 500.
pub(crate) fn internal_failure(cause: &dyn std::fmt::Display) -> Response {
    error!(error = %cause, "Internal error");
    fail(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
}

impl From<StoreError> for HttpStatus {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => HttpStatus::not_found(err),
            StoreError::UsernameTaken | StoreError::EmailTaken => HttpStatus::bad_request(err),
            StoreError::Database(_) => HttpStatus::internal(err),
        }
    }
}

pub(crate) fn respond<T>(outcome: Outcome<T>, success: HttpStatus) -> (Option<T>, HttpStatus) {
    match outcome {
        Ok(value) => (Some(value), success),
        Err(status) => (None, status),
    }
}

pub(crate) fn respond_empty(outcome: Outcome<()>) -> HttpStatus {
    outcome.err().unwrap_or_else(HttpStatus::ok)
}

// =============================================================================
// Request decoding
// =============================================================================

/// Claims attached by the authentication middleware.
///
/// Their absence means the route was wired without authentication, which is a
/// server bug, hence 500.
pub(crate) fn require_claims(request: &Request) -> Outcome<Claims> {
    claims(request.extensions())
        .cloned()
        .ok_or_else(|| HttpStatus::internal("no claims attached to protected request"))
}

/// The numeric `{id}` path segment.
pub(crate) async fn path_id(request: &mut Request) -> Outcome<i64> {
    request
        .extract_parts::<Path<i64>>()
        .await
        .map(|Path(id)| id)
        .map_err(|rejection| {
            HttpStatus::bad_request(format!("incorrect 'id': {}", rejection.body_text()))
        })
}

/// Decode the JSON body, consuming the request.
pub(crate) async fn json_body<T: DeserializeOwned>(request: Request) -> Outcome<T> {
    Json::<T>::from_request(request, &())
        .await
        .map(|Json(value)| value)
        .map_err(|rejection| HttpStatus::bad_request(rejection.body_text()))
}

/// Decode the query string.
pub(crate) fn query<T: DeserializeOwned>(request: &Request) -> Outcome<T> {
    Query::<T>::try_from_uri(request.uri())
        .map(|Query(value)| value)
        .map_err(|rejection| HttpStatus::bad_request(rejection.body_text()))
}
