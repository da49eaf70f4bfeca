//! Eventstores Engine — the append/query engine for versioned events and
//! the read-only state snapshot store.
//!
//! Both stores hold no data of their own. Every call resolves its partition
//! through a [`StoreConnector`](eventstores_core::connector::StoreConnector)
//! and talks to the returned collection.

pub mod event_stores;
pub mod grouping;
pub mod state_access;

pub use event_stores::EventStores;
pub use state_access::StateAccess;
