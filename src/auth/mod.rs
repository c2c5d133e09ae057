//! Authentication: signed tokens, password hashing and credential checks.
//!
//! All secrets live in one [`AuthConfig`], built once at startup and handed to
//! every component that needs it.

mod authority;
mod password;
mod token;

pub use authority::ApiAuthority;
pub use password::SaltedHasher;
pub use token::{TokenCodec, ALGORITHM, DEFAULT_TOKEN_TTL};

use std::fmt;
use std::time::Duration;

use argon2::Params;

/// Process-wide authentication settings.
#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC key for session tokens
    pub signing_key: Vec<u8>,

    /// Appended to every password before hashing
    pub password_salt: String,

    /// Lifetime of issued tokens and of the session cookie
    pub token_ttl: Duration,

    /// Argon2 cost parameters
    pub hash_params: Params,

    /// Add `Secure` to the session cookie (HTTPS deployments)
    pub secure_cookies: bool,
}

impl AuthConfig {
    /// Settings with an empty salt, the default TTL and argon2 defaults.
    pub fn new(signing_key: impl AsRef<[u8]>) -> Self {
        Self {
            signing_key: signing_key.as_ref().to_vec(),
            password_salt: String::new(),
            token_ttl: DEFAULT_TOKEN_TTL,
            hash_params: Params::default(),
            secure_cookies: false,
        }
    }

    pub fn with_password_salt(mut self, salt: impl Into<String>) -> Self {
        self.password_salt = salt.into();
        self
    }

    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    pub fn with_hash_params(mut self, params: Params) -> Self {
        self.hash_params = params;
        self
    }

    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    pub fn token_codec(&self) -> TokenCodec {
        TokenCodec::new(&self.signing_key)
    }

    pub fn hasher(&self) -> SaltedHasher {
        SaltedHasher::new(self.password_salt.clone(), self.hash_params.clone())
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("signing_key", &"<redacted>")
            .field("password_salt", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("hash_params", &self.hash_params)
            .field("secure_cookies", &self.secure_cookies)
            .finish()
    }
}
