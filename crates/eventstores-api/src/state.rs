//! Shared application state.

use std::sync::Arc;

use eventstores_core::connector::StoreConnector;
use eventstores_engine::EventStores;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Resolves partitions for both stores.
    pub connector: Arc<dyn StoreConnector>,
    /// The event log.
    pub event_stores: EventStores,
}

impl AppState {
    /// Create new application state over `connector`.
    #[must_use]
    pub fn new(connector: Arc<dyn StoreConnector>) -> Self {
        let event_stores = EventStores::new(Arc::clone(&connector));
        Self {
            connector,
            event_stores,
        }
    }
}
