//! The versioned event log.
//!
//! Events live in partitions resolved from `(scope, type)`. Versions are
//! assigned by the caller; this store neither checks nor serializes them,
//! so concurrent writers for one aggregate can both succeed.

use std::fmt;
use std::sync::Arc;

use eventstores_core::connector::{StoreConnector, decode_document};
use eventstores_core::cursor::Cursor;
use eventstores_core::error::StoreError;
use eventstores_core::event::{
    AGGREGATE_ID_FIELD, AggregateVersion, CREATED_AT_FIELD, Event, VERSION_FIELD,
};
use eventstores_core::query::{
    DateTimeRange, Filter, Pipeline, QueryOptions, Scalar, SortOrder,
};
use futures::future::join_all;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::grouping::group_by_type;

/// Only the version column of an event row.
#[derive(Deserialize)]
struct VersionRow {
    #[serde(rename = "_version")]
    version: u64,
}

/// Append/query engine for versioned events.
///
/// Stateless apart from the connector it borrows handles from; cheap to
/// clone and share across tasks.
#[derive(Clone)]
pub struct EventStores {
    connector: Arc<dyn StoreConnector>,
}

impl EventStores {
    /// Creates an event store that resolves partitions through `connector`.
    #[must_use]
    pub fn new(connector: Arc<dyn StoreConnector>) -> Self {
        Self { connector }
    }

    /// Inserts a single event into the partition `(scope, event.type)`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateEventId` if the id already exists in the
    /// partition, `StoreError::BackendUnavailable` if the partition cannot be
    /// resolved, and `StoreError::BackendWrite` for any other insert failure.
    #[instrument(skip(self, event), fields(event_id = %event.id, event_type = %event.event_type))]
    pub async fn store_event(&self, scope: &str, event: &Event) -> Result<(), StoreError> {
        let collection = self.connector.connect(scope, &event.event_type).await?;
        collection.insert_one(event.to_document()?).await?;
        debug!(aggregate_id = %event.aggregate_id, version = event.version, "stored event");
        Ok(())
    }

    /// Writes a heterogeneous batch, one concurrent batch insert per type.
    ///
    /// Every sub-batch runs to completion even when another fails, and
    /// committed sub-batches are not rolled back.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::BackendUnavailable` if a partition cannot be
    /// resolved, and `StoreError::BackendWrite` if any batch insert fails,
    /// without saying which types were committed.
    #[instrument(skip(self, events), fields(event_count = events.len()))]
    pub async fn store_events(&self, scope: &str, events: &[Event]) -> Result<(), StoreError> {
        let groups = group_by_type(events);
        if groups.is_empty() {
            return Ok(());
        }

        let writes = groups.into_iter().map(|(event_type, batch)| async move {
            let collection = self.connector.connect(scope, &event_type).await?;
            let documents = batch
                .iter()
                .map(Event::to_document)
                .collect::<Result<Vec<_>, _>>()?;
            let count = documents.len();
            collection
                .insert_many(documents)
                .await
                .map_err(|e| batch_write_error(&event_type, e))?;
            debug!(%event_type, count, "stored event batch");
            Ok::<(), StoreError>(())
        });

        let results = join_all(writes).await;
        for error in results.iter().filter_map(|r| r.as_ref().err()) {
            warn!(%error, "batch write failed; other batches may be committed");
        }
        results.into_iter().collect()
    }

    /// Looks up one event by id within `(scope, type)`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::BackendUnavailable` or `StoreError::BackendQuery`
    /// on backend failure. An absent event is `Ok(None)`.
    #[instrument(skip(self))]
    pub async fn query_by_event_id(
        &self,
        scope: &str,
        event_type: &str,
        event_id: &str,
    ) -> Result<Option<Event>, StoreError> {
        let collection = self.connector.connect(scope, event_type).await?;
        collection
            .find_one(event_id)
            .await?
            .map(decode_document)
            .transpose()
    }

    /// Returns the highest stored version for an aggregate, or `0` if it
    /// has no events.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::BackendUnavailable` or `StoreError::BackendQuery`
    /// on backend failure.
    #[instrument(skip(self))]
    pub async fn query_current_version(
        &self,
        scope: &str,
        event_type: &str,
        aggregate_id: &str,
    ) -> Result<AggregateVersion, StoreError> {
        let collection = self.connector.connect(scope, event_type).await?;
        let pipeline = Pipeline::new()
            .matching(by_aggregate(aggregate_id))
            .sort(VERSION_FIELD, SortOrder::Descending)
            .limit(1);
        let mut cursor: Cursor<VersionRow> =
            Cursor::from_aggregation(collection.aggregate(&pipeline).await?);
        let version = cursor.next().await?.map_or(0, |row| row.version);
        Ok(AggregateVersion {
            aggregate_id: aggregate_id.to_owned(),
            event_type: Some(event_type.to_owned()),
            version,
        })
    }

    /// Returns a cursor over an aggregate's events.
    ///
    /// Without `options` the cursor yields every event in the backend's
    /// natural order. With `options` the events are sorted by ascending
    /// version, starting at `initial_version` (inclusive) and capped at
    /// `limit` rows. Versions start at 1, so an `initial_version` of `0`
    /// selects the same events as no lower bound.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::BackendUnavailable` or `StoreError::BackendQuery`
    /// on backend failure.
    #[instrument(skip(self))]
    pub async fn query_events_by_aggregate_id(
        &self,
        scope: &str,
        event_type: &str,
        aggregate_id: &str,
        options: Option<QueryOptions>,
    ) -> Result<Cursor<Event>, StoreError> {
        let collection = self.connector.connect(scope, event_type).await?;
        let Some(QueryOptions {
            initial_version,
            limit,
        }) = options
        else {
            let rows = collection.find(&by_aggregate(aggregate_id)).await?;
            return Ok(Cursor::from_scan(rows));
        };

        let mut filter = by_aggregate(aggregate_id);
        if let Some(initial_version) = initial_version {
            filter = filter.gte(VERSION_FIELD, version_scalar(initial_version));
        }
        let mut pipeline = Pipeline::new()
            .matching(filter)
            .sort(VERSION_FIELD, SortOrder::Ascending);
        if let Some(limit) = limit {
            pipeline = pipeline.limit(limit);
        }
        let rows = collection.aggregate(&pipeline).await?;
        Ok(Cursor::from_aggregation(rows))
    }

    /// Returns a cursor over the events of `(scope, type)` created within
    /// `range`, in the backend's natural order. `None` selects every event.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::BackendUnavailable` or `StoreError::BackendQuery`
    /// on backend failure.
    #[instrument(skip(self))]
    pub async fn query_events_by_date_time(
        &self,
        scope: &str,
        event_type: &str,
        range: Option<DateTimeRange>,
    ) -> Result<Cursor<Event>, StoreError> {
        let collection = self.connector.connect(scope, event_type).await?;
        let mut filter = Filter::all();
        if let Some(DateTimeRange { from, to }) = range {
            if let Some(from) = from {
                filter = filter.gte(CREATED_AT_FIELD, Scalar::Timestamp(from));
            }
            if let Some(to) = to {
                filter = filter.lt(CREATED_AT_FIELD, Scalar::Timestamp(to));
            }
        }
        let rows = collection.find(&filter).await?;
        Ok(Cursor::from_scan(rows))
    }
}

impl fmt::Debug for EventStores {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStores").finish_non_exhaustive()
    }
}

fn by_aggregate(aggregate_id: &str) -> Filter {
    Filter::all().eq(AGGREGATE_ID_FIELD, Scalar::Text(aggregate_id.to_owned()))
}

fn version_scalar(version: u64) -> Scalar {
    Scalar::Int(i64::try_from(version).unwrap_or(i64::MAX))
}

fn batch_write_error(event_type: &str, err: StoreError) -> StoreError {
    match err {
        StoreError::BackendUnavailable(_) => err,
        StoreError::BackendWrite(msg)
        | StoreError::BackendQuery(msg)
        | StoreError::DuplicateEventId(msg) => {
            StoreError::BackendWrite(format!("batch for type {event_type} failed: {msg}"))
        }
    }
}
