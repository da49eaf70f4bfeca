//! Eventstores Core — shared data model and storage contracts.
//!
//! This crate defines the event and snapshot shapes, the error kinds, the
//! Store Connector contract that backends implement, and the cursor adapter
//! that hides which retrieval path produced a result. It contains no
//! infrastructure code.

pub mod connector;
pub mod cursor;
pub mod error;
pub mod event;
pub mod query;
pub mod snapshot;
