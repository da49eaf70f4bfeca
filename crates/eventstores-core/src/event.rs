//! Event data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::connector::Document;
use crate::error::StoreError;

/// Storage field holding the event id.
pub const ID_FIELD: &str = "_id";
/// Storage field holding the aggregate id.
pub const AGGREGATE_ID_FIELD: &str = "aggregateID";
/// Storage field holding the per-aggregate version.
pub const VERSION_FIELD: &str = "_version";
/// Storage field holding the creation timestamp.
pub const CREATED_AT_FIELD: &str = "_createdAt";

/// An immutable fact recorded once.
///
/// Serializes to the storage record shape
/// `{ _id, aggregateID, type, name, _version, _createdAt, _createdBy?, payloads? }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event identifier, unique within its `(scope, type)` partition.
    #[serde(rename = "_id")]
    pub id: String,
    /// The aggregate this event applies to.
    #[serde(rename = "aggregateID")]
    pub aggregate_id: String,
    /// Event stream/category; also the partition key.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Semantic name of the event.
    pub name: String,
    /// Position in the aggregate history, assigned by the caller.
    #[serde(rename = "_version")]
    pub version: u64,
    /// Creation timestamp.
    #[serde(rename = "_createdAt")]
    pub created_at: DateTime<Utc>,
    /// Optional attribution.
    #[serde(
        rename = "_createdBy",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub created_by: Option<String>,
    /// Opaque payload, not interpreted by the stores.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payloads: Option<serde_json::Map<String, serde_json::Value>>,
}

impl Event {
    /// Converts the event into its storage document.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::BackendWrite` if the event does not serialize to
    /// a JSON object.
    pub fn to_document(&self) -> Result<Document, StoreError> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(doc)) => Ok(doc),
            Ok(other) => Err(StoreError::BackendWrite(format!(
                "event {} serialized to a non-object value: {other}",
                self.id
            ))),
            Err(e) => Err(StoreError::BackendWrite(format!(
                "failed to serialize event {}: {e}",
                self.id
            ))),
        }
    }
}

/// Derived current version of an aggregate; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateVersion {
    /// The aggregate identifier.
    #[serde(rename = "aggregateID")]
    pub aggregate_id: String,
    /// The event type, when computed from an event partition.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    /// Highest known version, or `0` when nothing is known.
    pub version: u64,
}
