//! Integration tests for the event log routes.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use eventstores_test_support::UnavailableConnector;

#[tokio::test]
async fn test_store_event_then_get_by_id_round_trip() {
    let (app, _) = common::build_in_memory_app();
    let event = common::event_json("A1234567890", "TestType", "1234567890", 1);

    // POST /api/v1/events/{scope}
    let (status, json) = common::post_json(app.clone(), "/api/v1/events/TestScope", &event).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["event_ids"], serde_json::json!(["A1234567890"]));

    // GET — verify persisted event
    let (status, json) = common::get_json(
        app,
        "/api/v1/events/TestScope/TestType/by-id/A1234567890",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, event);
}

#[tokio::test]
async fn test_get_unknown_event_returns_404() {
    let (app, _) = common::build_in_memory_app();

    let (status, json) =
        common::get_json(app, "/api/v1/events/TestScope/TestType/by-id/missing").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "not_found");
}

#[tokio::test]
async fn test_duplicate_event_returns_409() {
    let (app, _) = common::build_in_memory_app();
    let event = common::event_json("e-1", "TestType", "agg", 1);
    common::post_json(app.clone(), "/api/v1/events/TestScope", &event).await;

    let (status, json) = common::post_json(app, "/api/v1/events/TestScope", &event).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "duplicate_event_id");
}

#[tokio::test]
async fn test_current_version_defaults_to_zero_then_tracks_max() {
    let (app, _) = common::build_in_memory_app();
    let uri = "/api/v1/events/TestScope/TestType/aggregates/agg/version";

    let (status, json) = common::get_json(app.clone(), uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        serde_json::json!({ "aggregateID": "agg", "type": "TestType", "version": 0 })
    );

    let batch: Vec<_> = (1..=3)
        .map(|v| common::event_json(&format!("e-{v}"), "TestType", "agg", v))
        .collect();
    let (status, _) = common::post_json(
        app.clone(),
        "/api/v1/events/TestScope/batch",
        &serde_json::Value::Array(batch),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, json) = common::get_json(app, uri).await;
    assert_eq!(json["version"], 3);
}

#[tokio::test]
async fn test_ranged_listing_applies_initial_version_and_limit() {
    let (app, _) = common::build_in_memory_app();
    let batch: Vec<_> = (1..=10)
        .rev()
        .map(|v| common::event_json(&format!("event-{v}"), "TestType", "agg", v))
        .collect();
    common::post_json(
        app.clone(),
        "/api/v1/events/TestScope/batch",
        &serde_json::Value::Array(batch),
    )
    .await;

    let (status, json) = common::get_json(
        app.clone(),
        "/api/v1/events/TestScope/TestType/aggregates/agg?initial_version=5&limit=2",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let versions: Vec<u64> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["_version"].as_u64().unwrap())
        .collect();
    assert_eq!(versions, vec![5, 6]);

    // Without parameters the listing keeps insertion order.
    let (_, json) =
        common::get_json(app, "/api/v1/events/TestScope/TestType/aggregates/agg").await;
    assert_eq!(json.as_array().unwrap()[0]["_version"], 10);
}

#[tokio::test]
async fn test_batch_routes_types_to_separate_partitions() {
    let (app, connector) = common::build_in_memory_app();
    let batch = serde_json::json!([
        common::event_json("a-1", "Alpha", "agg-a", 1),
        common::event_json("b-1", "Beta", "agg-b", 1),
        common::event_json("a-2", "Alpha", "agg-a", 2),
    ]);

    common::post_json(app, "/api/v1/events/TestScope/batch", &batch).await;

    assert_eq!(connector.collection("TestScope", "Alpha").rows().len(), 2);
    assert_eq!(connector.collection("TestScope", "Beta").rows().len(), 1);
}

#[tokio::test]
async fn test_date_time_listing_filters_by_range() {
    let (app, _) = common::build_in_memory_app();
    for (id, at) in [
        ("early", "2026-01-15T08:00:00Z"),
        ("middle", "2026-01-15T10:00:00Z"),
        ("late", "2026-01-15T12:00:00Z"),
    ] {
        let mut event = common::event_json(id, "TestType", "agg", 1);
        event["_createdAt"] = serde_json::json!(at);
        common::post_json(app.clone(), "/api/v1/events/TestScope", &event).await;
    }

    let (status, json) = common::get_json(
        app,
        "/api/v1/events/TestScope/TestType?from=2026-01-15T09:00:00Z&to=2026-01-15T12:00:00Z",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["middle"]);
}

#[tokio::test]
async fn test_unavailable_backend_returns_503() {
    let app = common::build_test_app(Arc::new(UnavailableConnector));

    let (status, json) = common::get_json(
        app,
        "/api/v1/events/TestScope/TestType/aggregates/agg/version",
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["error"], "backend_unavailable");
}
