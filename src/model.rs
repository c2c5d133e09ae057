//! Domain types for users, todos and categories.
//!
//! Request bodies default every missing field to its zero value so that
//! omissions surface as validation hints instead of decode errors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::router::{Hint, ValidationErrors};

/// Minimum password length accepted at sign-up.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Id of the implicit "uncategorized" bucket every user has.
pub const UNCATEGORIZED_ID: i64 = 0;

// =============================================================================
// Users
// =============================================================================

/// A stored account.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created: DateTime<Utc>,
}

/// Sign-up request body.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for CreateUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateUser")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl CreateUser {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.name.is_empty() {
            errors.hint("name", Hint::EmptyString);
        }
        if self.email.is_empty() {
            errors.hint("email", Hint::EmptyString);
        } else if !self.email.contains('@') {
            errors.hint("email", Hint::IncorrectFormat);
        }
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.hint("password", Hint::MinimumLength8);
        }
        errors.into_result()
    }
}

/// A user ready to be persisted: the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

// =============================================================================
// Todos
// =============================================================================

/// A named bucket of todos, scoped to one owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TodoCategory {
    pub id: i64,
    pub name: String,
}

impl TodoCategory {
    /// The implicit category of todos filed nowhere else.
    pub fn uncategorized() -> Self {
        Self {
            id: UNCATEGORIZED_ID,
            name: "uncategorized".to_string(),
        }
    }
}

/// A stored todo item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    pub owner: i64,
    pub text: String,
    pub done: bool,
    pub created: DateTime<Utc>,
    pub category: TodoCategory,
}

/// Body of `POST /api/todo` and `PUT /api/todo/{id}`.
///
/// Only `category.id` is read; the stored name is authoritative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CreateTodo {
    pub text: String,
    pub done: bool,
    pub category: TodoCategory,
}

impl CreateTodo {
    pub fn validate_new(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.text.is_empty() {
            errors.hint("text", Hint::EmptyString);
        }
        errors.into_result()
    }
}

impl From<&Todo> for CreateTodo {
    fn from(todo: &Todo) -> Self {
        Self {
            text: todo.text.clone(),
            done: todo.done,
            category: todo.category.clone(),
        }
    }
}
