//! Store error types.

use thiserror::Error;

/// Errors surfaced by the event and state stores.
///
/// A point lookup that finds nothing is not an error; it is returned as
/// `Ok(None)`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The connector could not produce a collection handle.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// A scan or aggregation failed after a handle was obtained.
    #[error("backend query error: {0}")]
    BackendQuery(String),

    /// An insert or batch insert failed.
    #[error("backend write error: {0}")]
    BackendWrite(String),

    /// A write violated the partition's id uniqueness.
    #[error("duplicate event id: {0}")]
    DuplicateEventId(String),
}

impl StoreError {
    /// Returns a short machine-readable code for this error kind.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::BackendUnavailable(_) => "backend_unavailable",
            Self::BackendQuery(_) => "backend_query_error",
            Self::BackendWrite(_) => "backend_write_error",
            Self::DuplicateEventId(_) => "duplicate_event_id",
        }
    }
}
