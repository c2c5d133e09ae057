use thiserror::Error;

/// Route table misconfiguration detected while building or finalizing routes.
///
/// Every variant is fatal: the process must not start serving with an
/// inconsistent route table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The same method was bound twice on one route node
    #[error("multiple {method} handlers for path \"{path}\"")]
    DuplicateMethod { method: String, path: String },

    /// A route node was reached more than once while finalizing
    #[error("methods for path \"{path}\" are registered multiple times")]
    AlreadyRegistered { path: String },

    /// Two route nodes resolve to the same full path
    #[error("path \"{path}\" is bound by more than one route node")]
    DuplicatePath { path: String },

    /// Two full paths differ only in capture names and cannot both be served
    #[error("path \"{path}\" conflicts with \"{existing}\"")]
    ConflictingPath { path: String, existing: String },

    /// A leaf route has neither handlers nor subroutes
    #[error("path \"{path}\" has no handlers")]
    EmptyRoute { path: String },

    /// The full path cannot be served (must start with '/', no wildcards)
    #[error("invalid path \"{path}\": {reason}")]
    InvalidPath { path: String, reason: &'static str },

    /// A route id that does not belong to this tree
    #[error("unknown route id {0}")]
    UnknownRoute(usize),
}

/// Reasons a signed token is rejected.
///
/// These stay internal: every variant is reported to clients as 401.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Not a compact JWT, or a header that cannot be decoded
    #[error("malformed token: {0}")]
    Malformed(String),

    /// The header names a different algorithm than the one we sign with
    #[error("incorrect signing method: {found}")]
    AlgorithmMismatch { found: String },

    /// The signature does not match the header and claims
    #[error("signature is invalid")]
    InvalidSignature,

    /// The token expired
    #[error("token expired")]
    Expired,

    /// A required claim is missing or has the wrong type
    #[error("invalid claims: {0}")]
    InvalidClaims(String),

    /// The claims could not be encoded while issuing
    #[error("could not encode claims: {0}")]
    Encode(String),
}

/// Errors from hashing or verifying passwords.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordError {
    /// The stored hash is not a valid PHC string
    #[error("stored password hash is malformed")]
    MalformedHash,

    /// The presented password does not match
    #[error("password mismatch")]
    Mismatch,

    /// Hashing failed
    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// Errors returned by the user and todo stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No item with that id for that owner
    #[error("item not found")]
    NotFound,

    /// A user with that name already exists
    #[error("username is already taken")]
    UsernameTaken,

    /// A user with that email already exists
    #[error("email is already taken")]
    EmailTaken,

    /// Database driver error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
