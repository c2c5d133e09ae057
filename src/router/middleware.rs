//! Request logging and authentication middlewares.
//!
//! Authentication middlewares pull a credential out of the request, hand it to
//! an [`Authority`], and on success attach the resulting [`Claims`] to the
//! request before continuing. Handlers read them back with [`claims`].
//!
//! # Credential sources
//!
//! | Middleware    | Reads                         | Scheme   |
//! |---------------|-------------------------------|----------|
//! | [`basic_auth`] | `Authorization: Basic <b64>` | `basic`  |
//! | [`jwt_auth`]   | `Cookie: jwt=<token>`        | `bearer` |

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::Request,
    http::{header, Extensions, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::handler::{Middleware, Next};

/// Name of the cookie carrying the signed token.
pub const JWT_COOKIE: &str = "jwt";

// =============================================================================
// Claims and request context
// =============================================================================

/// The authenticated subject of one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    pub name: String,
}

/// Private extension slot. Only this module can insert or read it, so no
/// unrelated extension can be mistaken for the claims.
#[derive(Clone)]
struct ClaimsSlot(Claims);

/// Claims attached by an authentication middleware, if any.
pub fn claims(extensions: &Extensions) -> Option<&Claims> {
    extensions.get::<ClaimsSlot>().map(|slot| &slot.0)
}

fn attach_claims(request: &mut Request, claims: Claims) {
    request.extensions_mut().insert(ClaimsSlot(claims));
}

// =============================================================================
// Authority
// =============================================================================

/// Supported authentication schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Basic,
    Bearer,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Basic => "basic",
            Scheme::Bearer => "bearer",
        }
    }
}

impl std::fmt::Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for scheme names we do not handle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported authentication scheme: {0}")]
pub struct UnsupportedScheme(pub String);

impl FromStr for Scheme {
    type Err = UnsupportedScheme;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("basic") {
            Ok(Scheme::Basic)
        } else if s.eq_ignore_ascii_case("bearer") {
            Ok(Scheme::Bearer)
        } else {
            Err(UnsupportedScheme(s.to_string()))
        }
    }
}

/// Validates credentials.
///
/// Returns `None` for any failure; callers cannot tell why.
#[async_trait]
pub trait Authority: Send + Sync + 'static {
    async fn authorize(&self, scheme: Scheme, payload: &str) -> Option<Claims>;
}

// =============================================================================
// Logging
// =============================================================================

struct LogCall;

#[async_trait]
impl Middleware for LogCall {
    async fn handle(&self, request: Request, next: Next) -> Response {
        debug!(method = %request.method(), path = %request.uri().path(), "Incoming request");
        next.run(request).await
    }
}

/// Log every request's method and path on entry.
pub fn log_call() -> impl Middleware {
    LogCall
}

// =============================================================================
// Authentication
// =============================================================================

/// Where an authentication middleware looks for its credential.
#[derive(Debug, Clone, Copy)]
enum CredentialSource {
    /// Every `Authorization` header value of the form `<scheme> <payload>`
    AuthorizationHeader,
    /// A single named cookie
    Cookie(&'static str),
}

/// Authentication middleware; see [`basic_auth`] and [`jwt_auth`].
pub struct Authenticate {
    authority: Arc<dyn Authority>,
    scheme: Scheme,
    source: CredentialSource,
}

/// Authenticate with `Authorization: Basic <base64(user:password)>`.
///
/// Values are tried in order and the first one that validates wins.
///
/// - no `Authorization` header: 401
/// - a value without a space separator, reached before any success: 400
/// - no value with a matching scheme that validates: 401
pub fn basic_auth(authority: Arc<dyn Authority>) -> Authenticate {
    Authenticate {
        authority,
        scheme: Scheme::Basic,
        source: CredentialSource::AuthorizationHeader,
    }
}

/// Authenticate with the signed token stored in the `jwt` cookie.
pub fn jwt_auth(authority: Arc<dyn Authority>) -> Authenticate {
    Authenticate {
        authority,
        scheme: Scheme::Bearer,
        source: CredentialSource::Cookie(JWT_COOKIE),
    }
}

impl Authenticate {
    async fn from_authorization(&self, headers: &HeaderMap) -> Result<Claims, StatusCode> {
        let mut values = headers.get_all(header::AUTHORIZATION).iter().peekable();
        if values.peek().is_none() {
            debug!(scheme = %self.scheme, "Authentication failed: no credential");
            return Err(StatusCode::UNAUTHORIZED);
        }

        for value in values {
            // sample: "Basic YWRtaW46YWRtaW4="
            let Some((scheme, payload)) = value.to_str().ok().and_then(|v| v.split_once(' '))
            else {
                debug!(scheme = %self.scheme, "Authentication failed: malformed header");
                return Err(StatusCode::BAD_REQUEST);
            };
            if scheme.parse::<Scheme>().ok() != Some(self.scheme) {
                continue;
            }
            if let Some(claims) = self.authority.authorize(self.scheme, payload).await {
                return Ok(claims);
            }
        }

        debug!(scheme = %self.scheme, "Authentication failed: credential rejected");
        Err(StatusCode::UNAUTHORIZED)
    }

    async fn from_cookie(&self, headers: &HeaderMap, name: &str) -> Result<Claims, StatusCode> {
        let Some(token) = find_cookie(headers, name) else {
            debug!(scheme = %self.scheme, "Authentication failed: no credential");
            return Err(StatusCode::UNAUTHORIZED);
        };

        match self.authority.authorize(self.scheme, &token).await {
            Some(claims) => Ok(claims),
            None => {
                debug!(scheme = %self.scheme, "Authentication failed: credential rejected");
                Err(StatusCode::UNAUTHORIZED)
            }
        }
    }
}

#[async_trait]
impl Middleware for Authenticate {
    async fn handle(&self, mut request: Request, next: Next) -> Response {
        let result = match self.source {
            CredentialSource::AuthorizationHeader => {
                self.from_authorization(request.headers()).await
            }
            CredentialSource::Cookie(name) => self.from_cookie(request.headers(), name).await,
        };

        match result {
            Ok(claims) => {
                attach_claims(&mut request, claims);
                next.run(request).await
            }
            Err(status) => status.into_response(),
        }
    }
}

/// Value of the first cookie called `name` across all `Cookie` headers.
fn find_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().to_string())
}

// =============================================================================
// Tests
// =============================================================================
