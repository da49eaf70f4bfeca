//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use eventstores_core::connector::StoreConnector;
use eventstores_test_support::InMemoryConnector;
use http_body_util::BodyExt;
use tower::ServiceExt;

use eventstores_api::routes;
use eventstores_api::state::AppState;

/// Build the full app router over `connector`. Uses the same route
/// structure as `main.rs`.
pub fn build_test_app(connector: Arc<dyn StoreConnector>) -> Router {
    routes::router().with_state(AppState::new(connector))
}

/// Build the app over a fresh in-memory connector, returning both so tests
/// can seed or inspect storage directly.
pub fn build_in_memory_app() -> (Router, Arc<InMemoryConnector>) {
    let connector = Arc::new(InMemoryConnector::new());
    (build_test_app(connector.clone()), connector)
}

/// A sample event body in storage shape.
pub fn event_json(id: &str, event_type: &str, aggregate_id: &str, version: u64) -> serde_json::Value {
    serde_json::json!({
        "_id": id,
        "aggregateID": aggregate_id,
        "type": event_type,
        "name": "TestEventName",
        "_version": version,
        "_createdAt": "2026-01-15T10:00:00Z",
        "_createdBy": "creator",
        "payloads": {}
    })
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}
