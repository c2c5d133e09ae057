//! Credential validation against the user store.

use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use tracing::{debug, error};

use super::password::SaltedHasher;
use super::token::TokenCodec;
use crate::error::{PasswordError, StoreError, TokenError};
use crate::router::{Authority, Claims, Scheme};
use crate::store::UserStore;

/// Why a credential was turned away. Only ever logged.
#[derive(Debug, thiserror::Error)]
enum Rejection {
    #[error("payload is not base64 'user:password'")]
    Encoding,

    #[error("no such user")]
    UnknownUser,

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Store(StoreError),

    #[error("password check aborted: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Validates basic credentials against stored password hashes and bearer
/// tokens against the signing key.
pub struct ApiAuthority {
    users: Arc<dyn UserStore>,
    tokens: TokenCodec,
    hasher: SaltedHasher,
}

impl ApiAuthority {
    pub fn new(users: Arc<dyn UserStore>, tokens: TokenCodec, hasher: SaltedHasher) -> Self {
        Self {
            users,
            tokens,
            hasher,
        }
    }

    async fn validate_basic(&self, payload: &str) -> Result<Claims, Rejection> {
        let (username, password) = decode_basic(payload).ok_or(Rejection::Encoding)?;

        let user = match self.users.get_user_by_name(&username).await {
            Ok(user) => user,
            Err(StoreError::NotFound) => {
                // same argon2 cost as a wrong password
                let hasher = self.hasher.clone();
                tokio::task::spawn_blocking(move || hasher.reject(&username, &password)).await?;
                return Err(Rejection::UnknownUser);
            }
            Err(e) => return Err(Rejection::Store(e)),
        };

        let hasher = self.hasher.clone();
        let stored = user.password_hash.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&username, &password, &stored))
            .await??;

        Ok(Claims {
            id: user.id,
            name: user.name,
        })
    }
}

#[async_trait]
impl Authority for ApiAuthority {
    async fn authorize(&self, scheme: Scheme, payload: &str) -> Option<Claims> {
        let result = match scheme {
            Scheme::Basic => self.validate_basic(payload).await,
            Scheme::Bearer => self.tokens.verify(payload).map_err(Rejection::from),
        };

        match result {
            Ok(claims) => Some(claims),
            Err(reason @ (Rejection::Store(_) | Rejection::Task(_))) => {
                error!(%scheme, error = %reason, "Credential check failed");
                None
            }
            Err(reason) => {
                debug!(%scheme, reason = %reason, "Credential rejected");
                None
            }
        }
    }
}

/// Split a base64 `user:password` payload at the first colon.
fn decode_basic(payload: &str) -> Option<(String, String)> {
    let decoded = STANDARD.decode(payload.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}
