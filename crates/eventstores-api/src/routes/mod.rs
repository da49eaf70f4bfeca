//! Route modules, one per store.

use axum::Router;

use crate::state::AppState;

pub mod events;
pub mod health;
pub mod snapshots;

/// Returns every route of the service, without middleware layers.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/api/v1/events", events::router())
        .nest("/api/v1/state", snapshots::router())
}
