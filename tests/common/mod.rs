//! Shared fixtures for the API tests: the full application router over
//! the in-memory store, plus request plumbing.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use vibes_backend::app::{create_app, AppState};
use vibes_backend::auth::TokenKeys;
use vibes_backend::config::{Environment, Settings};
use vibes_backend::store::MemoryStore;

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
}

pub fn test_settings() -> Settings {
    Settings {
        env: Environment::Dev,
        server_addr: "127.0.0.1:0".to_string(),
        database_url: "postgres://unused".to_string(),
        database_max_connections: 1,
        redis_url: "redis://unused".to_string(),
        redis_cache_ttl_seconds: 60,
        cors_allow_origins: vec!["http://localhost:3000".to_string()],
        jwt_secret: "test-secret".to_string(),
        jwt_issuer: "vibes-backend".to_string(),
        jwt_ttl_seconds: 3600,
    }
}

pub fn spawn_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let settings = test_settings();
    let tokens = TokenKeys::from_settings(&settings);
    let state = AppState::new(store.clone(), settings, tokens);

    TestApp {
        router: create_app(state),
        store,
    }
}

/// Fire one request at the router and return status plus parsed body
/// (`Value::Null` for empty bodies).
pub async fn request(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, value)
}

/// Register an account and log it in; returns (user id, bearer token).
pub async fn register_and_login(app: &TestApp, email: &str) -> (Uuid, String) {
    let (status, body) = request(
        &app.router,
        Method::POST,
        "/users",
        None,
        Some(serde_json::json!({
            "email": email,
            "password": "testpass123",
            "name": "Test Name",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    let user_id = Uuid::parse_str(body["data"]["id"].as_str().unwrap()).unwrap();

    let (status, body) = request(
        &app.router,
        Method::POST,
        "/users/token",
        None,
        Some(serde_json::json!({
            "email": email,
            "password": "testpass123",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    let token = body["token"].as_str().unwrap().to_string();

    (user_id, token)
}

/// Create a profile for an already-authenticated user; returns its id.
pub async fn create_profile(app: &TestApp, token: &str, body: Value) -> Uuid {
    let (status, body) = request(
        &app.router,
        Method::POST,
        "/profiles",
        Some(token),
        Some(body),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "profile create failed: {body}");

    Uuid::parse_str(body["data"]["id"].as_str().unwrap()).unwrap()
}
