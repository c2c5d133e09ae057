//! Todo endpoints, all scoped to the authenticated user.

use std::sync::Arc;

use axum::extract::Request;
use serde::Deserialize;

use super::errors::{json_body, path_id, query, require_claims, Outcome};
use super::Server;
use crate::model::{CreateTodo, Todo};
use crate::router::HttpStatus;

/// `GET /api/todo`
pub(super) async fn get_all(server: Arc<Server>, request: Request) -> Outcome<Vec<Todo>> {
    let claims = require_claims(&request)?;
    Ok(server.todos.get_all_todos(claims.id).await?)
}

/// `POST /api/todo`; answers 201 with the new id.
pub(super) async fn create(server: Arc<Server>, request: Request) -> Outcome<i64> {
    let claims = require_claims(&request)?;
    let todo: CreateTodo = json_body(request).await?;
    todo.validate_new()?;
    Ok(server.todos.create_todo(claims.id, &todo).await?)
}

/// `GET /api/todo/{id}`
pub(super) async fn get_one(server: Arc<Server>, mut request: Request) -> Outcome<Todo> {
    let claims = require_claims(&request)?;
    let id = path_id(&mut request).await?;
    Ok(server.todos.get_todo(claims.id, id).await?)
}

/// `PUT /api/todo/{id}`: replace text, done flag and category.
pub(super) async fn replace(server: Arc<Server>, mut request: Request) -> Outcome<()> {
    let claims = require_claims(&request)?;
    let id = path_id(&mut request).await?;
    let todo: CreateTodo = json_body(request).await?;
    todo.validate_new()?;
    Ok(server.todos.update_todo(claims.id, id, &todo).await?)
}

/// Query parameters of `PATCH /api/todo/{id}`. Empty values count as absent.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TodoPatch {
    done: Option<String>,
    text: Option<String>,
}

/// `PATCH /api/todo/{id}?done=<bool>&text=<string>`
///
/// Updates only the given fields and preserves everything else.
pub(super) async fn patch(server: Arc<Server>, mut request: Request) -> Outcome<()> {
    let claims = require_claims(&request)?;
    let id = path_id(&mut request).await?;
    let patch: TodoPatch = query(&request)?;

    let current = server.todos.get_todo(claims.id, id).await?;
    let mut changes = CreateTodo::from(&current);
    if let Some(done) = patch.done.as_deref().filter(|v| !v.is_empty()) {
        changes.done = parse_bool(done)
            .ok_or_else(|| HttpStatus::bad_request(format!("invalid boolean for 'done': {done}")))?;
    }
    if let Some(text) = patch.text.filter(|v| !v.is_empty()) {
        changes.text = text;
    }

    Ok(server.todos.update_todo(claims.id, id, &changes).await?)
}

/// `DELETE /api/todo/{id}`
pub(super) async fn delete(server: Arc<Server>, mut request: Request) -> Outcome<()> {
    let claims = require_claims(&request)?;
    let id = path_id(&mut request).await?;
    Ok(server.todos.delete_todo(claims.id, id).await?)
}

/// Accepts `1 t T TRUE true True` and `0 f F FALSE false False`.
fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
