//! Todo and category API integration tests.
//!
//! Tests verify:
//! - Todo create/read/replace/patch/delete
//! - Every item is visible only to its owner
//! - Category lifecycle, including re-filing todos on delete
//! - Error codes for bad input and missing items

use axum::http::{Method, StatusCode};
use serde_json::json;

use super::test_utils::{body_json, body_string, json_request, request, TestApp};

// =============================================================================
// Todos
// =============================================================================

#[tokio::test]
async fn test_create_and_fetch_todo() {
    let app = TestApp::new();
    let cookie = app.register_and_login("ada").await;

    let id = app.create_todo(&cookie, "buy milk", 0).await;

    let response = app
        .send(request(Method::GET, &format!("/api/todo/{id}"), Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let todo = body_json(response).await;
    assert_eq!(todo["id"], id);
    assert_eq!(todo["owner"], app.user_id("ada").await);
    assert_eq!(todo["text"], "buy milk");
    assert_eq!(todo["done"], false);
    assert_eq!(todo["category"], json!({ "id": 0, "name": "uncategorized" }));
    assert!(todo["created"].is_string());
}

#[tokio::test]
async fn test_create_todo_requires_text() {
    let app = TestApp::new();
    let cookie = app.register_and_login("ada").await;

    let body = json!({ "text": "", "done": false });
    let response = app
        .send(json_request(Method::POST, "/api/todo", Some(&cookie), body))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_string(response)
        .await
        .contains("- field 'text' is left empty"));
}

#[tokio::test]
async fn test_create_todo_rejects_malformed_body() {
    let app = TestApp::new();
    let cookie = app.register_and_login("ada").await;

    let body = json!({ "text": 42 });
    let response = app
        .send(json_request(Method::POST, "/api/todo", Some(&cookie), body))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_only_own_todos() {
    let app = TestApp::new();
    let ada = app.register_and_login("ada").await;
    let grace = app.register_and_login("grace").await;

    app.create_todo(&ada, "ada 1", 0).await;
    app.create_todo(&grace, "grace 1", 0).await;
    app.create_todo(&ada, "ada 2", 0).await;

    let response = app.send(request(Method::GET, "/api/todo", Some(&ada))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let todos = body_json(response).await;
    let texts: Vec<&str> = todos
        .as_array()
        .unwrap()
        .iter()
        .map(|todo| todo["text"].as_str().unwrap())
        .collect();
    assert_eq!(texts, vec!["ada 1", "ada 2"]);
}

#[tokio::test]
async fn test_empty_list_is_json_array() {
    let app = TestApp::new();
    let cookie = app.register_and_login("ada").await;

    let response = app
        .send(request(Method::GET, "/api/todo", Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn test_foreign_todo_is_not_found() {
    let app = TestApp::new();
    let ada = app.register_and_login("ada").await;
    let grace = app.register_and_login("grace").await;

    let id = app.create_todo(&ada, "private", 0).await;
    let uri = format!("/api/todo/{id}");

    let response = app.send(request(Method::GET, &uri, Some(&grace))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = json!({ "text": "hijacked", "done": true });
    let response = app
        .send(json_request(Method::PUT, &uri, Some(&grace), body))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .send(request(Method::PATCH, &format!("{uri}?done=true"), Some(&grace)))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.send(request(Method::DELETE, &uri, Some(&grace))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Still intact for its owner
    let response = app.send(request(Method::GET, &uri, Some(&ada))).await;
    let todo = body_json(response).await;
    assert_eq!(todo["text"], "private");
    assert_eq!(todo["done"], false);
}

#[tokio::test]
async fn test_replace_todo() {
    let app = TestApp::new();
    let cookie = app.register_and_login("ada").await;
    let category = app.create_category(&cookie, "home").await;
    let id = app.create_todo(&cookie, "draft", 0).await;
    let uri = format!("/api/todo/{id}");

    let body = json!({ "text": "final", "done": true, "category": { "id": category } });
    let response = app
        .send(json_request(Method::PUT, &uri, Some(&cookie), body))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.is_empty());

    let todo = body_json(app.send(request(Method::GET, &uri, Some(&cookie))).await).await;
    assert_eq!(todo["text"], "final");
    assert_eq!(todo["done"], true);
    assert_eq!(todo["category"], json!({ "id": category, "name": "home" }));
}

#[tokio::test]
async fn test_replace_missing_todo() {
    let app = TestApp::new();
    let cookie = app.register_and_login("ada").await;

    let body = json!({ "text": "ghost", "done": false });
    let response = app
        .send(json_request(Method::PUT, "/api/todo/999", Some(&cookie), body))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_patch_updates_only_given_fields() {
    let app = TestApp::new();
    let cookie = app.register_and_login("ada").await;
    let id = app.create_todo(&cookie, "water plants", 0).await;
    let uri = format!("/api/todo/{id}");

    let response = app
        .send(request(Method::PATCH, &format!("{uri}?done=true"), Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let todo = body_json(app.send(request(Method::GET, &uri, Some(&cookie))).await).await;
    assert_eq!(todo["done"], true);
    assert_eq!(todo["text"], "water plants");

    // Empty values count as absent
    let response = app
        .send(request(
            Method::PATCH,
            &format!("{uri}?done=&text=water%20cactus"),
            Some(&cookie),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let todo = body_json(app.send(request(Method::GET, &uri, Some(&cookie))).await).await;
    assert_eq!(todo["done"], true);
    assert_eq!(todo["text"], "water cactus");
}

#[tokio::test]
async fn test_patch_rejects_bad_boolean() {
    let app = TestApp::new();
    let cookie = app.register_and_login("ada").await;
    let id = app.create_todo(&cookie, "x", 0).await;

    let response = app
        .send(request(
            Method::PATCH,
            &format!("/api/todo/{id}?done=maybe"),
            Some(&cookie),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_todo() {
    let app = TestApp::new();
    let cookie = app.register_and_login("ada").await;
    let id = app.create_todo(&cookie, "done soon", 0).await;
    let uri = format!("/api/todo/{id}");

    let response = app.send(request(Method::DELETE, &uri, Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.send(request(Method::GET, &uri, Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.send(request(Method::DELETE, &uri, Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Categories
// =============================================================================

#[tokio::test]
async fn test_category_lifecycle() {
    let app = TestApp::new();
    let cookie = app.register_and_login("ada").await;

    let id = app.create_category(&cookie, "work").await;

    let response = app
        .send(request(Method::GET, "/api/todo/category", Some(&cookie)))
        .await;
    assert_eq!(
        body_json(response).await,
        json!([{ "id": id, "name": "work" }])
    );

    let uri = format!("/api/todo/category/{id}");
    let response = app
        .send(request(Method::PATCH, &format!("{uri}?name=office"), Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .send(request(Method::GET, "/api/todo/category", Some(&cookie)))
        .await;
    assert_eq!(
        body_json(response).await,
        json!([{ "id": id, "name": "office" }])
    );

    let response = app.send(request(Method::DELETE, &uri, Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .send(request(Method::GET, "/api/todo/category", Some(&cookie)))
        .await;
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn test_category_name_required() {
    let app = TestApp::new();
    let cookie = app.register_and_login("ada").await;

    let response = app
        .send(request(Method::POST, "/api/todo/category", Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .send(request(Method::POST, "/api/todo/category?name=", Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_category_refiles_todos() {
    let app = TestApp::new();
    let cookie = app.register_and_login("ada").await;
    let category = app.create_category(&cookie, "errands").await;
    let id = app.create_todo(&cookie, "post office", category).await;

    let response = app
        .send(request(
            Method::DELETE,
            &format!("/api/todo/category/{category}"),
            Some(&cookie),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let todo = body_json(
        app.send(request(Method::GET, &format!("/api/todo/{id}"), Some(&cookie)))
            .await,
    )
    .await;
    assert_eq!(todo["category"], json!({ "id": 0, "name": "uncategorized" }));
}

#[tokio::test]
async fn test_uncategorized_cannot_be_deleted() {
    let app = TestApp::new();
    let cookie = app.register_and_login("ada").await;

    let response = app
        .send(request(Method::DELETE, "/api/todo/category/0", Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_foreign_category_is_not_found() {
    let app = TestApp::new();
    let ada = app.register_and_login("ada").await;
    let grace = app.register_and_login("grace").await;
    let category = app.create_category(&ada, "secret").await;

    // Not listed for others
    let response = app
        .send(request(Method::GET, "/api/todo/category", Some(&grace)))
        .await;
    assert_eq!(body_json(response).await, json!([]));

    // Cannot be used, renamed or deleted by others
    let body = json!({ "text": "sneaky", "category": { "id": category } });
    let response = app
        .send(json_request(Method::POST, "/api/todo", Some(&grace), body))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let uri = format!("/api/todo/category/{category}");
    let response = app
        .send(request(Method::PATCH, &format!("{uri}?name=mine"), Some(&grace)))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.send(request(Method::DELETE, &uri, Some(&grace))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
