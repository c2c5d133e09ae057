//! Configuration management for check42.
//!
//! This module provides a flexible configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables (the same names the service has always read)
//! - Sensible defaults for all optional settings
//!
//! # Example
//!
//! ```ignore
//! use check42::config::Config;
//!
//! // Parse from command line and environment
//! let config = Config::parse();
//! config.validate()?;
//!
//! println!("Listening on {}", config.bind_address());
//! ```
//!
//! # Environment Variables
//!
//! - `SERVER_HOST` - Server bind address (default: 0.0.0.0)
//! - `SERVER_PORT` - Server port (default: 8080)
//! - `JWT_SECRET` - HMAC key for session tokens (required)
//! - `PW_SALT` - Salt appended to passwords before hashing (default: empty)
//! - `TOKEN_TTL` - Session lifetime in seconds (default: 604800, 7 days)
//! - `SECURE_COOKIES` - Mark the session cookie `Secure` (default: false)
//! - `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD`, `DB_NAME` - MySQL connection
//! - `DB_RETRIES` - Connection attempts before giving up (default: 5)

use std::time::Duration;

use argon2::Params;
use clap::Parser;
use sqlx::mysql::MySqlConnectOptions;

use crate::auth::{AuthConfig, DEFAULT_TOKEN_TTL};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default MySQL host.
pub const DEFAULT_DB_HOST: &str = "localhost";

/// Default MySQL port.
pub const DEFAULT_DB_PORT: u16 = 3306;

/// Default MySQL user.
pub const DEFAULT_DB_USER: &str = "root";

/// Default database name.
pub const DEFAULT_DB_NAME: &str = "check42";

/// Default number of connection attempts.
pub const DEFAULT_DB_RETRIES: u32 = 5;

// =============================================================================
// CLI Arguments
// =============================================================================

/// check42 - A multi-user to-do list service.
///
/// Users sign up, log in with basic credentials to receive a session cookie,
/// and manage their todos and categories through a JSON API.
#[derive(Parser, Debug, Clone)]
#[command(name = "check42")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "SERVER_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "SERVER_PORT")]
    pub port: u16,

    // =========================================================================
    // Authentication Configuration
    // =========================================================================
    /// Secret key for signing session tokens.
    ///
    /// The server refuses to start without it. Changing it logs out every user.
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Salt appended to every password before hashing.
    #[arg(long, default_value = "", env = "PW_SALT", hide_env_values = true)]
    pub pw_salt: String,

    /// Session lifetime in seconds.
    #[arg(long, default_value_t = DEFAULT_TOKEN_TTL.as_secs(), env = "TOKEN_TTL")]
    pub token_ttl: u64,

    /// Mark the session cookie `Secure` (only sent over HTTPS).
    #[arg(long, default_value_t = false, env = "SECURE_COOKIES")]
    pub secure_cookies: bool,

    /// Argon2 memory cost in KiB.
    #[arg(long, default_value_t = Params::DEFAULT_M_COST, env = "HASH_MEMORY_KIB")]
    pub hash_memory_kib: u32,

    /// Argon2 iterations.
    #[arg(long, default_value_t = Params::DEFAULT_T_COST, env = "HASH_ITERATIONS")]
    pub hash_iterations: u32,

    /// Argon2 lanes.
    #[arg(long, default_value_t = Params::DEFAULT_P_COST, env = "HASH_PARALLELISM")]
    pub hash_parallelism: u32,

    // =========================================================================
    // Storage Configuration
    // =========================================================================
    /// Keep all data in memory instead of MySQL. Data is lost on exit.
    #[arg(long, default_value_t = false)]
    pub in_memory: bool,

    /// MySQL host.
    #[arg(long, default_value = DEFAULT_DB_HOST, env = "DB_HOST")]
    pub db_host: String,

    /// MySQL port.
    #[arg(long, default_value_t = DEFAULT_DB_PORT, env = "DB_PORT")]
    pub db_port: u16,

    /// MySQL user.
    #[arg(long, default_value = DEFAULT_DB_USER, env = "DB_USER")]
    pub db_user: String,

    /// MySQL password.
    #[arg(long, env = "DB_PASSWORD", hide_env_values = true)]
    pub db_password: Option<String>,

    /// Database name.
    #[arg(long, default_value = DEFAULT_DB_NAME, env = "DB_NAME")]
    pub db_name: String,

    /// Connection attempts before giving up, 3 seconds apart.
    #[arg(long, default_value_t = DEFAULT_DB_RETRIES, env = "DB_RETRIES")]
    pub db_retries: u32,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        match self.jwt_secret.as_deref() {
            None | Some("") => {
                return Err(
                    "Missing token signing key. Set --jwt-secret or JWT_SECRET".to_string(),
                )
            }
            Some(_) => {}
        }

        if self.token_ttl == 0 {
            return Err("token_ttl must be greater than 0".to_string());
        }

        self.hash_params()?;

        if !self.in_memory {
            if self.db_host.is_empty() {
                return Err("Database host is required. Set --db-host or DB_HOST".to_string());
            }
            if self.db_retries == 0 {
                return Err("db_retries must be greater than 0".to_string());
            }
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Argon2 parameters from the hash cost options.
    pub fn hash_params(&self) -> Result<Params, String> {
        Params::new(
            self.hash_memory_kib,
            self.hash_iterations,
            self.hash_parallelism,
            None,
        )
        .map_err(|e| format!("invalid password hashing parameters: {e}"))
    }

    /// Build the process-wide authentication settings (call validate() first).
    pub fn auth_config(&self) -> Result<AuthConfig, String> {
        let secret = self
            .jwt_secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "Missing token signing key".to_string())?;

        Ok(AuthConfig::new(secret)
            .with_password_salt(self.pw_salt.clone())
            .with_token_ttl(Duration::from_secs(self.token_ttl))
            .with_hash_params(self.hash_params()?)
            .with_secure_cookies(self.secure_cookies))
    }

    /// MySQL connection options from the `db_*` settings.
    pub fn mysql_options(&self) -> MySqlConnectOptions {
        let options = MySqlConnectOptions::new()
            .host(&self.db_host)
            .port(self.db_port)
            .username(&self.db_user)
            .database(&self.db_name);
        match &self.db_password {
            Some(password) => options.password(password),
            None => options,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
