//! Routes for the event log.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{
    Json, Router,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use eventstores_core::event::{AggregateVersion, Event};
use eventstores_core::query::{DateTimeRange, QueryOptions};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::state::AppState;

/// Response body returned after events are stored.
#[derive(Debug, Serialize)]
pub struct StoredResponse {
    /// IDs of the events written, in request order.
    pub event_ids: Vec<String>,
}

/// Query string for the aggregate event listing.
///
/// Supplying either parameter selects ranged mode.
#[derive(Debug, Default, Deserialize)]
pub struct RangeParams {
    /// Lowest version to return (inclusive).
    pub initial_version: Option<u64>,
    /// Maximum number of events to return.
    pub limit: Option<usize>,
}

impl RangeParams {
    fn into_options(self) -> Option<QueryOptions> {
        if self.initial_version.is_none() && self.limit.is_none() {
            return None;
        }
        Some(QueryOptions {
            initial_version: self.initial_version,
            limit: self.limit,
        })
    }
}

/// Query string for the creation-time listing.
#[derive(Debug, Default, Deserialize)]
pub struct DateTimeParams {
    /// Earliest creation time (inclusive), RFC 3339.
    pub from: Option<DateTime<Utc>>,
    /// Latest creation time (exclusive), RFC 3339.
    pub to: Option<DateTime<Utc>>,
}

impl DateTimeParams {
    fn into_range(self) -> Option<DateTimeRange> {
        if self.from.is_none() && self.to.is_none() {
            return None;
        }
        Some(DateTimeRange {
            from: self.from,
            to: self.to,
        })
    }
}

/// POST /{scope}
#[instrument(skip(state, event), fields(event_id = %event.id, event_type = %event.event_type))]
async fn store_event(
    State(state): State<AppState>,
    Path(scope): Path<String>,
    Json(event): Json<Event>,
) -> Result<(StatusCode, Json<StoredResponse>), ApiError> {
    state.event_stores.store_event(&scope, &event).await?;
    info!("stored event");
    Ok((
        StatusCode::CREATED,
        Json(StoredResponse {
            event_ids: vec![event.id],
        }),
    ))
}

/// POST /{scope}/batch
#[instrument(skip(state, events), fields(event_count = events.len()))]
async fn store_events(
    State(state): State<AppState>,
    Path(scope): Path<String>,
    Json(events): Json<Vec<Event>>,
) -> Result<(StatusCode, Json<StoredResponse>), ApiError> {
    state.event_stores.store_events(&scope, &events).await?;
    info!("stored event batch");
    let event_ids = events.into_iter().map(|e| e.id).collect();
    Ok((StatusCode::CREATED, Json(StoredResponse { event_ids })))
}

/// GET /{scope}/{event_type}/by-id/{event_id}
#[instrument(skip(state))]
async fn get_event(
    State(state): State<AppState>,
    Path((scope, event_type, event_id)): Path<(String, String, String)>,
) -> Result<Json<Event>, ApiError> {
    state
        .event_stores
        .query_by_event_id(&scope, &event_type, &event_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("event {event_id} not found")))
}

/// GET /{scope}/{event_type}/aggregates/{aggregate_id}/version
#[instrument(skip(state))]
async fn get_current_version(
    State(state): State<AppState>,
    Path((scope, event_type, aggregate_id)): Path<(String, String, String)>,
) -> Result<Json<AggregateVersion>, ApiError> {
    let version = state
        .event_stores
        .query_current_version(&scope, &event_type, &aggregate_id)
        .await?;
    Ok(Json(version))
}

/// GET /{scope}/{event_type}/aggregates/{aggregate_id}
#[instrument(skip(state))]
async fn list_aggregate_events(
    State(state): State<AppState>,
    Path((scope, event_type, aggregate_id)): Path<(String, String, String)>,
    Query(params): Query<RangeParams>,
) -> Result<Json<Vec<Event>>, ApiError> {
    let cursor = state
        .event_stores
        .query_events_by_aggregate_id(&scope, &event_type, &aggregate_id, params.into_options())
        .await?;
    Ok(Json(cursor.to_array().await?))
}

/// GET /{scope}/{event_type}
#[instrument(skip(state))]
async fn list_events_by_date_time(
    State(state): State<AppState>,
    Path((scope, event_type)): Path<(String, String)>,
    Query(params): Query<DateTimeParams>,
) -> Result<Json<Vec<Event>>, ApiError> {
    let cursor = state
        .event_stores
        .query_events_by_date_time(&scope, &event_type, params.into_range())
        .await?;
    Ok(Json(cursor.to_array().await?))
}

/// Returns the router for the event log.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{scope}", post(store_event))
        .route("/{scope}/batch", post(store_events))
        .route("/{scope}/{event_type}", get(list_events_by_date_time))
        .route("/{scope}/{event_type}/by-id/{event_id}", get(get_event))
        .route(
            "/{scope}/{event_type}/aggregates/{aggregate_id}",
            get(list_aggregate_events),
        )
        .route(
            "/{scope}/{event_type}/aggregates/{aggregate_id}/version",
            get(get_current_version),
        )
}
