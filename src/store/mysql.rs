//! MySQL-backed store.
//!
//! Queries are plain parameterised `sqlx::query` calls; each runs inside a
//! `db.query` span carrying the statement. The schema is created on connect
//! when missing.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::Row;
use tracing::{info, warn, Instrument, Span};

use super::{TodoStore, UserStore};
use crate::error::StoreError;
use crate::model::{CreateTodo, NewUser, Todo, TodoCategory, User, UNCATEGORIZED_ID};

/// Pause between connection attempts.
pub const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(3);

const SCHEMA: [&str; 3] = [
    r"
    CREATE TABLE IF NOT EXISTS `user` (
        id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        email VARCHAR(255) NOT NULL,
        password_hash VARCHAR(255) NOT NULL,
        created TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        UNIQUE KEY user_name (name),
        UNIQUE KEY user_email (email)
    )",
    r"
    CREATE TABLE IF NOT EXISTS category (
        id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
        owner BIGINT NOT NULL,
        name VARCHAR(255) NOT NULL,
        FOREIGN KEY (owner) REFERENCES `user` (id) ON DELETE CASCADE
    )",
    r"
    CREATE TABLE IF NOT EXISTS todo (
        id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
        owner BIGINT NOT NULL,
        text TEXT NOT NULL,
        done BOOLEAN NOT NULL DEFAULT FALSE,
        category BIGINT NOT NULL DEFAULT 0,
        created TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (owner) REFERENCES `user` (id) ON DELETE CASCADE
    )",
];

const SELECT_TODO: &str = r"
    SELECT t.id, t.owner, t.text, t.done, t.created, t.category, c.name AS category_name
    FROM todo t
    LEFT JOIN category c ON c.id = t.category AND c.owner = t.owner";

fn query_span(operation: &'static str, statement: &str) -> Span {
    tracing::debug_span!(
        "db.query",
        db.system = "mysql",
        db.operation = operation,
        db.statement = statement
    )
}

/// Store backed by a MySQL connection pool.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    /// Connect, retrying up to `attempts` times with [`CONNECT_RETRY_DELAY`]
    /// between tries, then make sure the schema exists.
    pub async fn connect(options: MySqlConnectOptions, attempts: u32) -> Result<Self, StoreError> {
        let attempts = attempts.max(1);
        let mut attempt = 1;
        let pool = loop {
            match MySqlPoolOptions::new().connect_with(options.clone()).await {
                Ok(pool) => break pool,
                Err(e) if attempt < attempts => {
                    warn!(
                        attempt,
                        attempts,
                        error = %e,
                        "Database not reachable, retrying in {}s",
                        CONNECT_RETRY_DELAY.as_secs()
                    );
                    attempt += 1;
                    tokio::time::sleep(CONNECT_RETRY_DELAY).await;
                }
                Err(e) => return Err(e.into()),
            }
        };
        info!(attempt, "Connected to database");

        let store = Self { pool };
        store.create_schema().await?;
        Ok(store)
    }

    async fn create_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .instrument(query_span("CREATE", statement))
                .await?;
        }
        Ok(())
    }

    /// Fail with `NotFound` unless `id` is 0 or one of `owner`'s categories.
    async fn ensure_category(&self, owner: i64, id: i64) -> Result<(), StoreError> {
        if id == UNCATEGORIZED_ID {
            return Ok(());
        }
        let query = "SELECT id FROM category WHERE id = ? AND owner = ?";
        sqlx::query(query)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", query))
            .await?
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}

fn user_from_row(row: &MySqlRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        created: row.try_get("created")?,
    })
}

fn todo_from_row(row: &MySqlRow) -> Result<Todo, sqlx::Error> {
    let category_id: i64 = row.try_get("category")?;
    let category_name: Option<String> = row.try_get("category_name")?;
    let category = match category_name {
        Some(name) if category_id != UNCATEGORIZED_ID => TodoCategory {
            id: category_id,
            name,
        },
        _ => TodoCategory::uncategorized(),
    };

    Ok(Todo {
        id: row.try_get("id")?,
        owner: row.try_get("owner")?,
        text: row.try_get("text")?,
        done: row.try_get("done")?,
        created: row.try_get("created")?,
        category,
    })
}

fn map_unique_violation(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            if db_err.message().contains("user_email") {
                StoreError::EmailTaken
            } else {
                StoreError::UsernameTaken
            }
        }
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl UserStore for MySqlStore {
    async fn get_user_by_name(&self, name: &str) -> Result<User, StoreError> {
        let query = "SELECT id, name, email, password_hash, created FROM `user` WHERE name = ?";
        let row = sqlx::query(query)
            .bind(name)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", query))
            .await?
            .ok_or(StoreError::NotFound)?;
        Ok(user_from_row(&row)?)
    }

    async fn get_user_by_id(&self, id: i64) -> Result<User, StoreError> {
        let query = "SELECT id, name, email, password_hash, created FROM `user` WHERE id = ?";
        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", query))
            .await?
            .ok_or(StoreError::NotFound)?;
        Ok(user_from_row(&row)?)
    }

    async fn create_user(&self, user: NewUser) -> Result<i64, StoreError> {
        let query = "INSERT INTO `user` (name, email, password_hash) VALUES (?, ?, ?)";
        let result = sqlx::query(query)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .execute(&self.pool)
            .instrument(query_span("INSERT", query))
            .await
            .map_err(map_unique_violation)?;
        Ok(result.last_insert_id() as i64)
    }
}

#[async_trait]
impl TodoStore for MySqlStore {
    async fn get_all_todos(&self, owner: i64) -> Result<Vec<Todo>, StoreError> {
        let query = format!("{SELECT_TODO} WHERE t.owner = ? ORDER BY t.id");
        let rows = sqlx::query(&query)
            .bind(owner)
            .fetch_all(&self.pool)
            .instrument(query_span("SELECT", &query))
            .await?;
        rows.iter()
            .map(todo_from_row)
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(StoreError::from)
    }

    async fn get_todo(&self, owner: i64, id: i64) -> Result<Todo, StoreError> {
        let query = format!("{SELECT_TODO} WHERE t.id = ? AND t.owner = ?");
        let row = sqlx::query(&query)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", &query))
            .await?
            .ok_or(StoreError::NotFound)?;
        Ok(todo_from_row(&row)?)
    }

    async fn create_todo(&self, owner: i64, todo: &CreateTodo) -> Result<i64, StoreError> {
        self.ensure_category(owner, todo.category.id).await?;

        let query = "INSERT INTO todo (owner, text, done, category) VALUES (?, ?, ?, ?)";
        let result = sqlx::query(query)
            .bind(owner)
            .bind(&todo.text)
            .bind(todo.done)
            .bind(todo.category.id)
            .execute(&self.pool)
            .instrument(query_span("INSERT", query))
            .await?;
        Ok(result.last_insert_id() as i64)
    }

    async fn update_todo(
        &self,
        owner: i64,
        id: i64,
        todo: &CreateTodo,
    ) -> Result<(), StoreError> {
        // affected-row counts exclude unchanged rows, so check existence first
        self.get_todo(owner, id).await?;
        self.ensure_category(owner, todo.category.id).await?;

        let query = "UPDATE todo SET text = ?, done = ?, category = ? WHERE id = ? AND owner = ?";
        sqlx::query(query)
            .bind(&todo.text)
            .bind(todo.done)
            .bind(todo.category.id)
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .instrument(query_span("UPDATE", query))
            .await?;
        Ok(())
    }

    async fn delete_todo(&self, owner: i64, id: i64) -> Result<(), StoreError> {
        let query = "DELETE FROM todo WHERE id = ? AND owner = ?";
        let result = sqlx::query(query)
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .instrument(query_span("DELETE", query))
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn get_all_categories(&self, owner: i64) -> Result<Vec<TodoCategory>, StoreError> {
        let query = "SELECT id, name FROM category WHERE owner = ? ORDER BY id";
        let rows = sqlx::query(query)
            .bind(owner)
            .fetch_all(&self.pool)
            .instrument(query_span("SELECT", query))
            .await?;
        rows.iter()
            .map(|row| {
                Ok(TodoCategory {
                    id: row.try_get("id")?,
                    name: row.try_get("name")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(StoreError::from)
    }

    async fn create_category(&self, owner: i64, name: &str) -> Result<i64, StoreError> {
        let query = "INSERT INTO category (owner, name) VALUES (?, ?)";
        let result = sqlx::query(query)
            .bind(owner)
            .bind(name)
            .execute(&self.pool)
            .instrument(query_span("INSERT", query))
            .await?;
        Ok(result.last_insert_id() as i64)
    }

    async fn update_category(&self, owner: i64, id: i64, name: &str) -> Result<(), StoreError> {
        if id == UNCATEGORIZED_ID {
            return Err(StoreError::NotFound);
        }
        self.ensure_category(owner, id).await?;

        let query = "UPDATE category SET name = ? WHERE id = ? AND owner = ?";
        sqlx::query(query)
            .bind(name)
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .instrument(query_span("UPDATE", query))
            .await?;
        Ok(())
    }

    async fn delete_category(&self, owner: i64, id: i64) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let query = "DELETE FROM category WHERE id = ? AND owner = ?";
        let deleted = sqlx::query(query)
            .bind(id)
            .bind(owner)
            .execute(&mut *tx)
            .instrument(query_span("DELETE", query))
            .await?;
        if deleted.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(StoreError::NotFound);
        }

        let query = "UPDATE todo SET category = ? WHERE category = ? AND owner = ?";
        sqlx::query(query)
            .bind(UNCATEGORIZED_ID)
            .bind(id)
            .bind(owner)
            .execute(&mut *tx)
            .instrument(query_span("UPDATE", query))
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
