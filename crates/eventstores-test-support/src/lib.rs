//! Shared test connectors for eventstores.

mod connector;
mod memory;

pub use connector::{FaultyConnector, InMemoryConnector, UnavailableConnector};
pub use memory::InMemoryCollection;
