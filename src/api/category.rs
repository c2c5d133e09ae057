//! Category endpoints, all scoped to the authenticated user.

use std::sync::Arc;

use axum::extract::Request;
use serde::Deserialize;

use super::errors::{path_id, query, require_claims, Outcome};
use super::Server;
use crate::model::{TodoCategory, UNCATEGORIZED_ID};
use crate::router::HttpStatus;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NameParam {
    name: String,
}

fn required_name(request: &Request) -> Outcome<String> {
    let NameParam { name } = query(request)?;
    if name.is_empty() {
        return Err(HttpStatus::bad_request("missing field 'name'"));
    }
    Ok(name)
}

/// `GET /api/todo/category`
pub(super) async fn get_all(server: Arc<Server>, request: Request) -> Outcome<Vec<TodoCategory>> {
    let claims = require_claims(&request)?;
    Ok(server.todos.get_all_categories(claims.id).await?)
}

/// `POST /api/todo/category?name=<name>`; answers with the new id.
pub(super) async fn create(server: Arc<Server>, request: Request) -> Outcome<i64> {
    let claims = require_claims(&request)?;
    let name = required_name(&request)?;
    Ok(server.todos.create_category(claims.id, &name).await?)
}

/// `PATCH /api/todo/category/{id}?name=<name>`
pub(super) async fn rename(server: Arc<Server>, mut request: Request) -> Outcome<()> {
    let claims = require_claims(&request)?;
    let id = path_id(&mut request).await?;
    let name = required_name(&request)?;
    Ok(server.todos.update_category(claims.id, id, &name).await?)
}

/// `DELETE /api/todo/category/{id}`; its todos move to category 0.
pub(super) async fn delete(server: Arc<Server>, mut request: Request) -> Outcome<()> {
    let claims = require_claims(&request)?;
    let id = path_id(&mut request).await?;
    if id == UNCATEGORIZED_ID {
        return Err(HttpStatus::bad_request("cannot delete this category"));
    }
    Ok(server.todos.delete_category(claims.id, id).await?)
}
