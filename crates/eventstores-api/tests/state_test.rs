//! Integration tests for the state store routes.

mod common;

use axum::http::StatusCode;
use eventstores_core::connector::{Collection, Document};
use eventstores_test_support::InMemoryConnector;

fn row(aggregate_id: &str, version: u64) -> Document {
    serde_json::json!({ "_id": aggregate_id, "_version": version, "owner": "Ada" })
        .as_object()
        .cloned()
        .unwrap()
}

async fn seed(connector: &InMemoryConnector, rows: Vec<Document>) {
    let collection = connector.collection("TestScope", "AccountState");
    for row in rows {
        collection.insert_one(row).await.unwrap();
    }
}

#[tokio::test]
async fn test_count_and_listing() {
    let (app, connector) = common::build_in_memory_app();
    seed(&connector, vec![row("acc-1", 2), row("acc-2", 5)]).await;

    let (status, json) =
        common::get_json(app.clone(), "/api/v1/state/TestScope/AccountState/count").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 2);

    let (status, json) = common::get_json(app, "/api/v1/state/TestScope/AccountState").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 2);
    assert_eq!(json[0]["owner"], "Ada");
}

#[tokio::test]
async fn test_get_aggregate_and_version() {
    let (app, connector) = common::build_in_memory_app();
    seed(&connector, vec![row("acc-1", 4)]).await;

    let (status, json) =
        common::get_json(app.clone(), "/api/v1/state/TestScope/AccountState/acc-1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["_id"], "acc-1");
    assert_eq!(json["_version"], 4);

    let (status, json) = common::get_json(
        app,
        "/api/v1/state/TestScope/AccountState/acc-1/version",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!({ "aggregateID": "acc-1", "version": 4 }));
}

#[tokio::test]
async fn test_missing_aggregate_returns_404_and_version_zero() {
    let (app, _) = common::build_in_memory_app();

    let (status, _) =
        common::get_json(app.clone(), "/api/v1/state/TestScope/AccountState/ghost").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, json) = common::get_json(
        app,
        "/api/v1/state/TestScope/AccountState/ghost/version",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["version"], 0);
}
