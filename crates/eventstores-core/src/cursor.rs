//! Cursor adapter over backend query results.
//!
//! A backend answers a plain scan with a [`ScanResult`] and a pipeline with an
//! [`AggregationResult`]. Both wrap a lazy row stream, and both become the
//! same [`Cursor`], so callers never branch on the retrieval path.

use std::fmt;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::{self, BoxStream, Peekable, Stream, StreamExt};
use serde::de::DeserializeOwned;

use crate::connector::{Document, decode_document};
use crate::error::StoreError;

/// A lazy stream of raw backend rows.
pub type RowStream = BoxStream<'static, Result<Document, StoreError>>;

/// Rows produced by a filtered scan.
pub struct ScanResult(RowStream);

impl ScanResult {
    /// Wraps a backend scan stream.
    #[must_use]
    pub fn new(rows: RowStream) -> Self {
        Self(rows)
    }

    /// Wraps rows that are already in memory.
    #[must_use]
    pub fn from_documents(documents: Vec<Document>) -> Self {
        Self(stream::iter(documents.into_iter().map(Ok)).boxed())
    }
}

/// Rows produced by a match/sort/limit pipeline.
pub struct AggregationResult(RowStream);

impl AggregationResult {
    /// Wraps a backend aggregation stream.
    #[must_use]
    pub fn new(rows: RowStream) -> Self {
        Self(rows)
    }

    /// Wraps rows that are already in memory.
    #[must_use]
    pub fn from_documents(documents: Vec<Document>) -> Self {
        Self(stream::iter(documents.into_iter().map(Ok)).boxed())
    }
}

/// A forward-only, lazy sequence of rows decoded as `T`.
///
/// Not rewindable: rows consumed by [`Cursor::next`] are not returned again,
/// and [`Cursor::to_array`] yields only what remains.
pub struct Cursor<T> {
    rows: Peekable<RowStream>,
    row: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Cursor<T> {
    /// Creates a cursor over the rows of a scan.
    #[must_use]
    pub fn from_scan(result: ScanResult) -> Self {
        Self::over(result.0)
    }

    /// Creates a cursor over the rows of an aggregation pipeline.
    #[must_use]
    pub fn from_aggregation(result: AggregationResult) -> Self {
        Self::over(result.0)
    }

    fn over(rows: RowStream) -> Self {
        Self {
            rows: rows.peekable(),
            row: PhantomData,
        }
    }

    /// Returns `true` if at least one more row is available, without
    /// consuming it.
    ///
    /// # Errors
    ///
    /// Returns the backend error if fetching the next row failed. The failed
    /// row is consumed.
    pub async fn has_next(&mut self) -> Result<bool, StoreError> {
        let peeked = Pin::new(&mut self.rows)
            .peek()
            .await
            .map(Result::is_ok);
        match peeked {
            None => Ok(false),
            Some(true) => Ok(true),
            Some(false) => match self.rows.next().await {
                Some(Err(e)) => Err(e),
                _ => Ok(false),
            },
        }
    }

    /// Consumes and returns the next row, or `None` once exhausted.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::BackendQuery` if the row cannot be decoded, or the
    /// backend error if fetching failed.
    pub async fn next(&mut self) -> Result<Option<T>, StoreError> {
        match self.rows.next().await {
            None => Ok(None),
            Some(row) => row.and_then(decode_document).map(Some),
        }
    }

    /// Drains the remaining rows in the order the backend produced them.
    ///
    /// # Errors
    ///
    /// Returns the first fetch or decode error encountered.
    pub async fn to_array(mut self) -> Result<Vec<T>, StoreError> {
        let mut rows = Vec::new();
        while let Some(row) = self.rows.next().await {
            rows.push(row.and_then(decode_document)?);
        }
        Ok(rows)
    }
}

impl<T: DeserializeOwned> Stream for Cursor<T> {
    type Item = Result<T, StoreError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.rows)
            .poll_next(cx)
            .map(|row| row.map(|r| r.and_then(decode_document)))
    }
}

impl<T> fmt::Debug for Cursor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("row", &std::any::type_name::<T>())
            .finish_non_exhaustive()
    }
}
