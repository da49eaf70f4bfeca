//! Eventstores PG — a `PostgreSQL` implementation of the store connector.
//!
//! Every partition is a table holding one JSONB document per row. Tables are
//! created on first use.

pub mod pg_collection;
pub mod pg_stores_connector;
pub mod schema;
pub mod sql;

pub use pg_collection::PgCollection;
pub use pg_stores_connector::PgStoresConnector;
