//! In-process store.
//!
//! All state lives behind one `RwLock`; ids are assigned from per-table
//! counters starting at 1.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{TodoStore, UserStore};
use crate::error::StoreError;
use crate::model::{CreateTodo, NewUser, Todo, TodoCategory, User, UNCATEGORIZED_ID};

struct StoredTodo {
    owner: i64,
    text: String,
    done: bool,
    created: DateTime<Utc>,
    category: i64,
}

struct StoredCategory {
    owner: i64,
    name: String,
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    todos: BTreeMap<i64, StoredTodo>,
    categories: BTreeMap<i64, StoredCategory>,
    last_user_id: i64,
    last_todo_id: i64,
    last_category_id: i64,
}

impl Tables {
    fn category_for(&self, owner: i64, id: i64) -> Result<TodoCategory, StoreError> {
        if id == UNCATEGORIZED_ID {
            return Ok(TodoCategory::uncategorized());
        }
        match self.categories.get(&id) {
            Some(category) if category.owner == owner => Ok(TodoCategory {
                id,
                name: category.name.clone(),
            }),
            _ => Err(StoreError::NotFound),
        }
    }

    fn render(&self, id: i64, todo: &StoredTodo) -> Todo {
        let category = self
            .category_for(todo.owner, todo.category)
            .unwrap_or_else(|_| TodoCategory::uncategorized());
        Todo {
            id,
            owner: todo.owner,
            text: todo.text.clone(),
            done: todo.done,
            created: todo.created,
            category,
        }
    }

    fn owned_todo_mut(&mut self, owner: i64, id: i64) -> Result<&mut StoredTodo, StoreError> {
        match self.todos.get_mut(&id) {
            Some(todo) if todo.owner == owner => Ok(todo),
            _ => Err(StoreError::NotFound),
        }
    }
}

/// Store keeping everything in memory; contents are lost on exit.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_user_by_name(&self, name: &str) -> Result<User, StoreError> {
        let tables = self.tables.read().await;
        tables
            .users
            .values()
            .find(|user| user.name == name)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_user_by_id(&self, id: i64) -> Result<User, StoreError> {
        let tables = self.tables.read().await;
        tables.users.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn create_user(&self, user: NewUser) -> Result<i64, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.name == user.name) {
            return Err(StoreError::UsernameTaken);
        }
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::EmailTaken);
        }

        tables.last_user_id += 1;
        let id = tables.last_user_id;
        tables.users.insert(
            id,
            User {
                id,
                name: user.name,
                email: user.email,
                password_hash: user.password_hash,
                created: Utc::now(),
            },
        );
        Ok(id)
    }
}

#[async_trait]
impl TodoStore for MemoryStore {
    async fn get_all_todos(&self, owner: i64) -> Result<Vec<Todo>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .todos
            .iter()
            .filter(|(_, todo)| todo.owner == owner)
            .map(|(id, todo)| tables.render(*id, todo))
            .collect())
    }

    async fn get_todo(&self, owner: i64, id: i64) -> Result<Todo, StoreError> {
        let tables = self.tables.read().await;
        match tables.todos.get(&id) {
            Some(todo) if todo.owner == owner => Ok(tables.render(id, todo)),
            _ => Err(StoreError::NotFound),
        }
    }

    async fn create_todo(&self, owner: i64, todo: &CreateTodo) -> Result<i64, StoreError> {
        let mut tables = self.tables.write().await;
        tables.category_for(owner, todo.category.id)?;

        tables.last_todo_id += 1;
        let id = tables.last_todo_id;
        tables.todos.insert(
            id,
            StoredTodo {
                owner,
                text: todo.text.clone(),
                done: todo.done,
                created: Utc::now(),
                category: todo.category.id,
            },
        );
        Ok(id)
    }

    async fn update_todo(
        &self,
        owner: i64,
        id: i64,
        todo: &CreateTodo,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables.category_for(owner, todo.category.id)?;

        let stored = tables.owned_todo_mut(owner, id)?;
        stored.text = todo.text.clone();
        stored.done = todo.done;
        stored.category = todo.category.id;
        Ok(())
    }

    async fn delete_todo(&self, owner: i64, id: i64) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables.owned_todo_mut(owner, id)?;
        tables.todos.remove(&id);
        Ok(())
    }

    async fn get_all_categories(&self, owner: i64) -> Result<Vec<TodoCategory>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .categories
            .iter()
            .filter(|(_, category)| category.owner == owner)
            .map(|(id, category)| TodoCategory {
                id: *id,
                name: category.name.clone(),
            })
            .collect())
    }

    async fn create_category(&self, owner: i64, name: &str) -> Result<i64, StoreError> {
        let mut tables = self.tables.write().await;
        tables.last_category_id += 1;
        let id = tables.last_category_id;
        tables.categories.insert(
            id,
            StoredCategory {
                owner,
                name: name.to_string(),
            },
        );
        Ok(id)
    }

    async fn update_category(&self, owner: i64, id: i64, name: &str) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        match tables.categories.get_mut(&id) {
            Some(category) if category.owner == owner => {
                category.name = name.to_string();
                Ok(())
            }
            _ => Err(StoreError::NotFound),
        }
    }

    async fn delete_category(&self, owner: i64, id: i64) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        match tables.categories.get(&id) {
            Some(category) if category.owner == owner => {}
            _ => return Err(StoreError::NotFound),
        }

        tables.categories.remove(&id);
        for todo in tables.todos.values_mut() {
            if todo.owner == owner && todo.category == id {
                todo.category = UNCATEGORIZED_ID;
            }
        }
        Ok(())
    }
}
