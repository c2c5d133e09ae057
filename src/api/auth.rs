//! Account endpoints.
//!
//! - `POST /auth/signin` - create an account
//! - `POST /auth/login`  - exchange basic credentials for a session cookie
//! - `POST /auth/logout` - clear the session cookie
//!
//! These write their responses directly instead of going through `proc`,
//! because sign-up reports duplicates with a JSON message and login sets a
//! cookie.

use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header::SET_COOKIE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{error, info};

use super::errors::{fail, internal_failure, json_body};
use super::Server;
use crate::auth::AuthConfig;
use crate::error::StoreError;
use crate::model::{CreateUser, NewUser};
use crate::router::{claims, HttpStatus, JWT_COOKIE};

/// `POST /auth/signin`
///
/// # Response
///
/// - `201 Created` with no body
/// - `400` with the validation hints as plain text
/// - `400` with `{"error": "username is already taken"}` (or email)
pub(super) async fn signin(server: Arc<Server>, request: Request) -> Response {
    let user: CreateUser = match json_body(request).await {
        Ok(user) => user,
        Err(_) => return fail(StatusCode::BAD_REQUEST, "could not read user"),
    };
    if let Err(errors) = user.validate() {
        return HttpStatus::validation(errors).into_response();
    }

    let hasher = server.hasher.clone();
    let CreateUser {
        name,
        email,
        password,
    } = user;
    let hashed = {
        let name = name.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&name, &password)).await
    };
    let password_hash = match hashed {
        Ok(Ok(hash)) => hash,
        Ok(Err(e)) => return internal_failure(&e),
        Err(e) => return internal_failure(&e),
    };

    match server
        .users
        .create_user(NewUser {
            name,
            email,
            password_hash,
        })
        .await
    {
        Ok(id) => {
            info!(user_id = id, "Account created");
            StatusCode::CREATED.into_response()
        }
        Err(e @ (StoreError::UsernameTaken | StoreError::EmailTaken)) => {
            fail(StatusCode::BAD_REQUEST, e.to_string())
        }
        Err(e) => internal_failure(&e),
    }
}

/// `POST /auth/login`, behind basic authentication.
///
/// Sets the `jwt` cookie to a token for the authenticated user.
pub(super) async fn login(server: Arc<Server>, request: Request) -> Response {
    let Some(claims) = claims(request.extensions()).cloned() else {
        error!("Login reached without claims");
        return fail(StatusCode::INTERNAL_SERVER_ERROR, "internal error");
    };

    let token = match server.tokens.issue(&claims, server.auth.token_ttl) {
        Ok(token) => token,
        Err(e) => return internal_failure(&e),
    };
    let cookie = match session_cookie(&server.auth, &token) {
        Ok(cookie) => cookie,
        Err(e) => return internal_failure(&e),
    };

    info!(user_id = claims.id, "User logged in");
    (StatusCode::OK, [(SET_COOKIE, cookie)]).into_response()
}

/// `POST /auth/logout`
///
/// Always succeeds; the cookie is replaced by an expired one.
pub(super) async fn logout(server: Arc<Server>, _request: Request) -> Response {
    match clear_session_cookie(&server.auth) {
        Ok(cookie) => (StatusCode::OK, [(SET_COOKIE, cookie)]).into_response(),
        Err(e) => internal_failure(&e),
    }
}

/// `HttpOnly` cookie carrying the session token.
fn session_cookie(
    config: &AuthConfig,
    token: &str,
) -> Result<HeaderValue, axum::http::header::InvalidHeaderValue> {
    let ttl_seconds = config.token_ttl.as_secs();
    let mut cookie =
        format!("{JWT_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_seconds}");
    if config.secure_cookies {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn clear_session_cookie(
    config: &AuthConfig,
) -> Result<HeaderValue, axum::http::header::InvalidHeaderValue> {
    let mut cookie = format!(
        "{JWT_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; \
         Expires=Thu, 01 Jan 1970 00:00:00 GMT; Max-Age=0"
    );
    if config.secure_cookies {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}
