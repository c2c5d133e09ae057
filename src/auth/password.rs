//! Salted password hashing.
//!
//! The hashed material is `username ++ password ++ salt`, where the salt is the
//! process-wide `PW_SALT`. Argon2id adds its own random per-hash salt on top
//! and stores everything in a PHC string.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::error::PasswordError;

/// Hashes and verifies passwords with a process-wide salt.
#[derive(Clone)]
pub struct SaltedHasher {
    salt: String,
    argon2: Argon2<'static>,
}

impl SaltedHasher {
    pub fn new(salt: impl Into<String>, params: Params) -> Self {
        Self {
            salt: salt.into(),
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    /// Produce a PHC-formatted hash for storage.
    pub fn hash(&self, username: &str, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(self.material(username, password).as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::Hash(e.to_string()))
    }

    /// Check a presented password against a stored hash.
    pub fn verify(
        &self,
        username: &str,
        password: &str,
        stored: &str,
    ) -> Result<(), PasswordError> {
        let parsed = PasswordHash::new(stored).map_err(|_| PasswordError::MalformedHash)?;
        self.argon2
            .verify_password(self.material(username, password).as_bytes(), &parsed)
            .map_err(|_| PasswordError::Mismatch)
    }

    /// Run one hash computation and fail; used when no stored hash exists.
    ///
    /// Keeps a miss on the user lookup about as slow as a wrong password.
    pub fn reject(&self, username: &str, password: &str) -> PasswordError {
        match self.hash(username, password) {
            Ok(_) => PasswordError::Mismatch,
            Err(e) => e,
        }
    }

    fn material(&self, username: &str, password: &str) -> String {
        let mut material = String::with_capacity(username.len() + password.len() + self.salt.len());
        material.push_str(username);
        material.push_str(password);
        material.push_str(&self.salt);
        material
    }
}
