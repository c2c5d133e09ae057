//! Persistence for users, todos and categories.
//!
//! Two backends implement the same traits:
//!
//! - [`MemoryStore`]: in-process maps, used for `--in-memory` and tests
//! - [`MySqlStore`]: a MySQL database reached through `sqlx`
//!
//! Every todo and category operation takes the owner id from the
//! authenticated claims. An item that exists but belongs to someone else is
//! reported as [`StoreError::NotFound`], exactly like an absent one.

mod memory;
mod mysql;

pub use memory::MemoryStore;
pub use mysql::{MySqlStore, CONNECT_RETRY_DELAY};

use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::{CreateTodo, NewUser, Todo, TodoCategory, User};

// =============================================================================
// UserStore Trait
// =============================================================================

/// Account lookup and creation.
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    /// Find a user by login name.
    async fn get_user_by_name(&self, name: &str) -> Result<User, StoreError>;

    /// Find a user by id.
    async fn get_user_by_id(&self, id: i64) -> Result<User, StoreError>;

    /// Persist a new account and return its id.
    ///
    /// # Errors
    /// [`StoreError::UsernameTaken`] or [`StoreError::EmailTaken`] when the
    /// name or email is already in use.
    async fn create_user(&self, user: NewUser) -> Result<i64, StoreError>;
}

// =============================================================================
// TodoStore Trait
// =============================================================================

/// Owner-scoped todo and category storage.
#[async_trait]
pub trait TodoStore: Send + Sync + 'static {
    /// All todos of `owner`, oldest first.
    async fn get_all_todos(&self, owner: i64) -> Result<Vec<Todo>, StoreError>;

    async fn get_todo(&self, owner: i64, id: i64) -> Result<Todo, StoreError>;

    /// Create a todo and return its id.
    ///
    /// The category must be 0 or one of `owner`'s categories.
    async fn create_todo(&self, owner: i64, todo: &CreateTodo) -> Result<i64, StoreError>;

    /// Overwrite text, done flag and category of an existing todo.
    async fn update_todo(&self, owner: i64, id: i64, todo: &CreateTodo)
        -> Result<(), StoreError>;

    async fn delete_todo(&self, owner: i64, id: i64) -> Result<(), StoreError>;

    /// Categories created by `owner`. The implicit category 0 is not listed.
    async fn get_all_categories(&self, owner: i64) -> Result<Vec<TodoCategory>, StoreError>;

    async fn create_category(&self, owner: i64, name: &str) -> Result<i64, StoreError>;

    async fn update_category(&self, owner: i64, id: i64, name: &str) -> Result<(), StoreError>;

    /// Delete a category, moving its todos to category 0.
    async fn delete_category(&self, owner: i64, id: i64) -> Result<(), StoreError>;
}
