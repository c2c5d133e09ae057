//! Signed session tokens.
//!
//! Tokens are compact JWTs signed with HMAC-SHA256 (`HS256`) and carry the
//! claims `{"sub": <name>, "id": <user id>, "exp": <unix seconds>}`.
//!
//! # Security Properties
//!
//! - **Fixed algorithm**: the header must name exactly `HS256`; anything else
//!   is rejected before the signature is looked at
//! - **Required claims**: `sub` and `exp` must be present, `id` must decode
//! - **Time-limited**: `exp` is an absolute Unix timestamp with no leeway; a
//!   token is expired from the second `exp` is reached
//! - **Key rotation logs everyone out**: changing the signing key invalidates
//!   every outstanding token
//!
//! # Example
//!
//! ```rust
//! use check42::auth::TokenCodec;
//! use check42::router::Claims;
//! use std::time::Duration;
//!
//! let codec = TokenCodec::new("my-secret-key");
//! let claims = Claims { id: 1, name: "ada".to_string() };
//!
//! let token = codec.issue(&claims, Duration::from_secs(3600)).unwrap();
//! assert_eq!(codec.verify(&token).unwrap(), claims);
//! ```

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{
    decode, decode_header, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use serde::{Deserialize, Serialize};

use crate::error::TokenError;
use crate::router::Claims;

/// The only accepted value of the `alg` header field.
pub const ALGORITHM: &str = "HS256";

/// Default token lifetime (7 days).
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Debug, Serialize, Deserialize)]
struct Payload {
    sub: String,
    id: i64,
    exp: u64,
}

/// Issues and verifies signed tokens with one process-wide key.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(signing_key: impl AsRef<[u8]>) -> Self {
        let key = signing_key.as_ref();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(key),
            decoding: DecodingKey::from_secret(key),
            validation,
        }
    }

    /// Issue a token for `claims` valid for `ttl` from now.
    pub fn issue(&self, claims: &Claims, ttl: Duration) -> Result<String, TokenError> {
        self.issue_with_expiry(claims, unix_now().saturating_add(ttl.as_secs()))
    }

    /// Issue a token expiring at `expiry` (Unix epoch seconds).
    pub fn issue_with_expiry(&self, claims: &Claims, expiry: u64) -> Result<String, TokenError> {
        let payload = Payload {
            sub: claims.name.clone(),
            id: claims.id,
            exp: expiry,
        };
        encode(&Header::new(Algorithm::HS256), &payload, &self.encoding)
            .map_err(|e| TokenError::Encode(e.to_string()))
    }

    /// Verify a token and return its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let header = decode_header(token).map_err(|e| TokenError::Malformed(e.to_string()))?;
        if header.alg != Algorithm::HS256 {
            return Err(TokenError::AlgorithmMismatch {
                found: format!("{:?}", header.alg),
            });
        }

        let payload = decode::<Payload>(token, &self.decoding, &self.validation)
            .map_err(rejection)?
            .claims;

        // the validator only rejects once `exp` has passed
        if unix_now() >= payload.exp {
            return Err(TokenError::Expired);
        }

        Ok(Claims {
            id: payload.id,
            name: payload.sub,
        })
    }
}

fn rejection(err: jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::InvalidAlgorithm | ErrorKind::MissingAlgorithm => {
            TokenError::AlgorithmMismatch {
                found: err.to_string(),
            }
        }
        ErrorKind::MissingRequiredClaim(claim) => {
            TokenError::InvalidClaims(format!("missing '{claim}'"))
        }
        ErrorKind::Json(e) => TokenError::InvalidClaims(e.to_string()),
        _ => TokenError::Malformed(err.to_string()),
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

// =============================================================================
// Tests
// =============================================================================
