//! Store Connector contract.
//!
//! A connector resolves a `(scope, type)` pair to a [`Collection`] handle.
//! The stores borrow a handle per call; connection lifecycle, retries and
//! naming belong to the connector.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::cursor::{AggregationResult, ScanResult};
use crate::error::StoreError;
use crate::query::{Filter, Pipeline};

/// A stored row: a JSON object keyed by field name.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Decodes a stored row into a typed value.
///
/// # Errors
///
/// Returns `StoreError::BackendQuery` if the row does not match `T`.
pub fn decode_document<T: DeserializeOwned>(document: Document) -> Result<T, StoreError> {
    serde_json::from_value(serde_json::Value::Object(document))
        .map_err(|e| StoreError::BackendQuery(format!("malformed row: {e}")))
}

/// A partition handle supporting the operations the stores need.
///
/// Every method is a suspension point and either succeeds entirely or fails.
#[async_trait]
pub trait Collection: Send + Sync {
    /// Looks up one document by its `_id`.
    async fn find_one(&self, id: &str) -> Result<Option<Document>, StoreError>;

    /// Scans documents matching `filter` in natural (insertion) order.
    async fn find(&self, filter: &Filter) -> Result<ScanResult, StoreError>;

    /// Runs a match/sort/limit pipeline.
    async fn aggregate(&self, pipeline: &Pipeline) -> Result<AggregationResult, StoreError>;

    /// Counts every document in the partition.
    async fn count(&self) -> Result<u64, StoreError>;

    /// Inserts one document. Fails with `DuplicateEventId` on an `_id` collision.
    async fn insert_one(&self, document: Document) -> Result<(), StoreError>;

    /// Inserts documents in the given order.
    async fn insert_many(&self, documents: Vec<Document>) -> Result<(), StoreError>;
}

/// Resolves partitions to collection handles.
///
/// Implementations must be idempotent and safe to call concurrently, with no
/// ordering dependency between calls.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    /// Returns the collection for `(scope, type)`.
    async fn connect(&self, scope: &str, event_type: &str)
    -> Result<Arc<dyn Collection>, StoreError>;
}

/// How a connector names the physical collection for a partition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollectionNaming {
    /// The collection is named after the type alone.
    #[default]
    TypeOnly,
    /// The collection is named `{scope}_{type}`.
    ScopeAndType,
}

impl CollectionNaming {
    /// Returns the collection name for a partition.
    #[must_use]
    pub fn collection_name(self, scope: &str, event_type: &str) -> String {
        match self {
            Self::TypeOnly => event_type.to_owned(),
            Self::ScopeAndType => format!("{scope}_{event_type}"),
        }
    }
}

impl fmt::Display for CollectionNaming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeOnly => f.write_str("type"),
            Self::ScopeAndType => f.write_str("scope_and_type"),
        }
    }
}

impl FromStr for CollectionNaming {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "type" => Ok(Self::TypeOnly),
            "scope_and_type" => Ok(Self::ScopeAndType),
            other => Err(format!(
                "unknown collection naming '{other}', expected 'type' or 'scope_and_type'"
            )),
        }
    }
}
