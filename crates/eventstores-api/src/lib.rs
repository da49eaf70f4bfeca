//! Eventstores API — HTTP hosting service for the event log and state stores.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
