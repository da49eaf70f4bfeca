//! Aggregate state rows.

use serde::{Deserialize, Serialize};

/// The latest known state of one aggregate.
///
/// Stored as `{ _id: aggregateID, _version, ...fields }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateSnapshot {
    /// The aggregate identifier, used as the row's primary key.
    #[serde(rename = "_id")]
    pub aggregate_id: String,
    /// Version of the last event applied to this snapshot.
    #[serde(rename = "_version", default)]
    pub version: u64,
    /// Remaining snapshot fields.
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}
