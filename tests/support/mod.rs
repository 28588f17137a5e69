//! Mock user API served by axum on an ephemeral port.

#![allow(dead_code)]

use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use serde_json::{Value, json};
use std::time::Duration;
use tokio::net::TcpListener;
use userflow::validation::{StaticGate, Validator};
use userflow::{HttpTransport, UserApi};

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn users() -> Vec<Value> {
    vec![
        json!({"id": 1, "name": "Zhang San", "email": "zhang@example.com", "age": 25, "isActive": true, "createdAt": "2024-01-15T10:30:00Z"}),
        json!({"id": 2, "name": "Li Si", "email": "li@example.com", "age": 30, "isActive": false, "createdAt": "2024-01-14T09:20:00Z"}),
        json!({"id": 3, "name": "Wang Wu", "email": "wang@example.com", "age": 28, "isActive": true, "createdAt": "2024-01-13T15:45:00Z"}),
    ]
}

async fn list_users() -> Json<Value> {
    Json(json!({"success": true, "data": users()}))
}

async fn get_user(Path(id): Path<i64>) -> Result<Json<Value>, StatusCode> {
    // id 4 answers with a record the user schema rejects
    if id == 4 {
        return Ok(Json(json!({"success": true, "data": {"id": 4, "name": ""}})));
    }
    users()
        .into_iter()
        .find(|user| user["id"] == json!(id))
        .map(|user| Json(json!({"success": true, "data": user})))
        .ok_or(StatusCode::NOT_FOUND)
}

async fn create_user(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "id": 999,
            "name": body.get("name").cloned().unwrap_or(json!("New User")),
            "email": body.get("email").cloned().unwrap_or(json!("new@example.com")),
            "age": body.get("age").cloned().unwrap_or(json!(25)),
            "isActive": body.get("isActive").cloned().unwrap_or(json!(false)),
            "createdAt": now(),
        }
    }))
}

async fn update_user(Path(id): Path<i64>, Json(body): Json<Value>) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "id": id,
            "name": body.get("name").cloned().unwrap_or(json!("Updated User")),
            "email": body.get("email").cloned().unwrap_or(json!("updated@example.com")),
            "age": body.get("age").cloned().unwrap_or(json!(30)),
            "isActive": body.get("isActive").cloned().unwrap_or(json!(true)),
            "createdAt": "2024-01-15T10:30:00Z",
            "updatedAt": now(),
        }
    }))
}

async fn delete_user(Path(id): Path<i64>) -> Json<Value> {
    Json(json!({
        "success": true,
        "message": format!("user {id} deleted"),
        "data": {"id": id, "deletedAt": now()}
    }))
}

/// Start the mock API and return its origin.
pub async fn spawn_mock_api() -> String {
    let app = Router::new()
        .route("/api/users", get(list_users).post(create_user))
        .route(
            "/api/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

pub fn quiet_validator() -> Validator {
    Validator::new(StaticGate::closed())
}

pub fn client(origin: &str) -> UserApi {
    UserApi::new(
        HttpTransport::new(origin, Duration::from_secs(5)).unwrap(),
        quiet_validator(),
    )
}
