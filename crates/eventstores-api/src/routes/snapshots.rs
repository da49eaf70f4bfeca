//! Routes for the aggregate state (snapshot) store.

use axum::extract::{Path, State};
use axum::{Json, Router, routing::get};
use eventstores_core::event::AggregateVersion;
use eventstores_core::snapshot::AggregateSnapshot;
use eventstores_engine::StateAccess;
use serde::Serialize;
use tracing::instrument;

use crate::error::ApiError;
use crate::state::AppState;

/// Response body for the row count.
#[derive(Debug, Serialize)]
pub struct CountResponse {
    /// Number of state rows in the partition.
    pub count: u64,
}

async fn state_access(
    state: &AppState,
    scope: &str,
    state_type: &str,
) -> Result<StateAccess, ApiError> {
    Ok(StateAccess::connect(state.connector.as_ref(), scope, state_type).await?)
}

/// GET /{scope}/{state_type}/count
#[instrument(skip(state))]
async fn count(
    State(state): State<AppState>,
    Path((scope, state_type)): Path<(String, String)>,
) -> Result<Json<CountResponse>, ApiError> {
    let access = state_access(&state, &scope, &state_type).await?;
    Ok(Json(CountResponse {
        count: access.count().await?,
    }))
}

/// GET /{scope}/{state_type}
#[instrument(skip(state))]
async fn list_aggregates(
    State(state): State<AppState>,
    Path((scope, state_type)): Path<(String, String)>,
) -> Result<Json<Vec<AggregateSnapshot>>, ApiError> {
    let access = state_access(&state, &scope, &state_type).await?;
    let cursor = access.fetch_aggregates().await?;
    Ok(Json(cursor.to_array().await?))
}

/// GET /{scope}/{state_type}/{aggregate_id}
#[instrument(skip(state))]
async fn get_aggregate(
    State(state): State<AppState>,
    Path((scope, state_type, aggregate_id)): Path<(String, String, String)>,
) -> Result<Json<AggregateSnapshot>, ApiError> {
    let access = state_access(&state, &scope, &state_type).await?;
    access
        .query_by_aggregate_id(&aggregate_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("aggregate {aggregate_id} not found")))
}

/// GET /{scope}/{state_type}/{aggregate_id}/version
#[instrument(skip(state))]
async fn get_version(
    State(state): State<AppState>,
    Path((scope, state_type, aggregate_id)): Path<(String, String, String)>,
) -> Result<Json<AggregateVersion>, ApiError> {
    let access = state_access(&state, &scope, &state_type).await?;
    Ok(Json(access.query_current_version(&aggregate_id).await?))
}

/// Returns the router for the state store.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{scope}/{state_type}", get(list_aggregates))
        .route("/{scope}/{state_type}/count", get(count))
        .route("/{scope}/{state_type}/{aggregate_id}", get(get_aggregate))
        .route("/{scope}/{state_type}/{aggregate_id}/version", get(get_version))
}
