//! Read-only access to per-aggregate state snapshots.
//!
//! Snapshots live in their own partition, one row per aggregate keyed by
//! aggregate id. The version reported here comes from the snapshot row and
//! may lag behind the event log.

use std::fmt;
use std::sync::Arc;

use eventstores_core::connector::{Collection, StoreConnector, decode_document};
use eventstores_core::cursor::Cursor;
use eventstores_core::error::StoreError;
use eventstores_core::event::AggregateVersion;
use eventstores_core::query::Filter;
use eventstores_core::snapshot::AggregateSnapshot;
use tracing::instrument;

/// Read-only view over one state partition.
#[derive(Clone)]
pub struct StateAccess {
    collection: Arc<dyn Collection>,
}

impl StateAccess {
    /// Wraps an already-resolved state collection.
    #[must_use]
    pub fn new(collection: Arc<dyn Collection>) -> Self {
        Self { collection }
    }

    /// Resolves the state partition `(scope, type)` and wraps it.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::BackendUnavailable` if the connector fails.
    pub async fn connect(
        connector: &dyn StoreConnector,
        scope: &str,
        state_type: &str,
    ) -> Result<Self, StoreError> {
        let collection = connector.connect(scope, state_type).await?;
        Ok(Self::new(collection))
    }

    /// Counts the state rows in the partition.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::BackendQuery` on backend failure.
    pub async fn count(&self) -> Result<u64, StoreError> {
        self.collection.count().await
    }

    /// Returns a cursor over every state row, unsorted.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::BackendQuery` on backend failure.
    pub async fn fetch_aggregates(&self) -> Result<Cursor<AggregateSnapshot>, StoreError> {
        let rows = self.collection.find(&Filter::all()).await?;
        Ok(Cursor::from_scan(rows))
    }

    /// Looks up the state row for one aggregate.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::BackendQuery` on backend failure. An absent row
    /// is `Ok(None)`.
    #[instrument(skip(self))]
    pub async fn query_by_aggregate_id(
        &self,
        aggregate_id: &str,
    ) -> Result<Option<AggregateSnapshot>, StoreError> {
        self.collection
            .find_one(aggregate_id)
            .await?
            .map(decode_document)
            .transpose()
    }

    /// Returns the snapshot's version, or `0` if no snapshot exists.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::BackendQuery` on backend failure.
    #[instrument(skip(self))]
    pub async fn query_current_version(
        &self,
        aggregate_id: &str,
    ) -> Result<AggregateVersion, StoreError> {
        let version = self
            .query_by_aggregate_id(aggregate_id)
            .await?
            .map_or(0, |row| row.version);
        Ok(AggregateVersion {
            aggregate_id: aggregate_id.to_owned(),
            event_type: None,
            version,
        })
    }
}

impl fmt::Debug for StateAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateAccess").finish_non_exhaustive()
    }
}
