//! Backend-neutral query vocabulary.
//!
//! The stores describe what they need from a collection with a [`Filter`]
//! (for plain scans) or a [`Pipeline`] of match, sort and limit stages. Each
//! backend translates these into its own query language.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A typed comparison operand.
///
/// Backends compare `Int` numerically and `Timestamp` chronologically, even
/// when the stored field is a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scalar {
    /// Signed integer operand.
    Int(i64),
    /// String operand, compared for equality or lexically.
    Text(String),
    /// Point in time operand.
    Timestamp(DateTime<Utc>),
}

/// Comparison applied to a single document field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// Field equals the operand.
    Eq(Scalar),
    /// Field is greater than or equal to the operand.
    Gte(Scalar),
    /// Field is strictly less than the operand.
    Lt(Scalar),
}

/// A single field condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    /// Top-level document field name.
    pub field: String,
    /// The comparison to apply.
    pub op: Op,
}

/// A conjunction of conditions. An empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    /// Conditions that must all hold.
    pub conditions: Vec<Condition>,
}

impl Filter {
    /// Returns a filter matching every document.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Adds an equality condition.
    #[must_use]
    pub fn eq(mut self, field: &str, value: Scalar) -> Self {
        self.conditions.push(Condition {
            field: field.to_owned(),
            op: Op::Eq(value),
        });
        self
    }

    /// Adds a lower-bound (inclusive) condition.
    #[must_use]
    pub fn gte(mut self, field: &str, value: Scalar) -> Self {
        self.conditions.push(Condition {
            field: field.to_owned(),
            op: Op::Gte(value),
        });
        self
    }

    /// Adds an upper-bound (exclusive) condition.
    #[must_use]
    pub fn lt(mut self, field: &str, value: Scalar) -> Self {
        self.conditions.push(Condition {
            field: field.to_owned(),
            op: Op::Lt(value),
        });
        self
    }

    /// Returns `true` if the filter has no conditions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Smallest first.
    Ascending,
    /// Largest first.
    Descending,
}

/// One stage of an aggregation pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    /// Keep only documents matching the filter.
    Match(Filter),
    /// Order documents by a field.
    Sort {
        /// Field to sort on.
        field: String,
        /// Direction.
        order: SortOrder,
    },
    /// Keep at most this many documents.
    Limit(usize),
}

/// An ordered list of stages, applied first to last.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pipeline {
    /// The stages in application order.
    pub stages: Vec<Stage>,
}

impl Pipeline {
    /// Creates an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a match stage.
    #[must_use]
    pub fn matching(mut self, filter: Filter) -> Self {
        self.stages.push(Stage::Match(filter));
        self
    }

    /// Appends a sort stage.
    #[must_use]
    pub fn sort(mut self, field: &str, order: SortOrder) -> Self {
        self.stages.push(Stage::Sort {
            field: field.to_owned(),
            order,
        });
        self
    }

    /// Appends a limit stage.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.stages.push(Stage::Limit(limit));
        self
    }
}

/// Range options for `query_events_by_aggregate_id`.
///
/// Passing `Some(QueryOptions)` selects ranged mode: results are sorted by
/// ascending version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct QueryOptions {
    /// Lowest version to return (inclusive).
    pub initial_version: Option<u64>,
    /// Maximum number of events to return.
    pub limit: Option<usize>,
}

/// Creation-time window for `query_events_by_date_time`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct DateTimeRange {
    /// Earliest creation time (inclusive).
    pub from: Option<DateTime<Utc>>,
    /// Latest creation time (exclusive).
    pub to: Option<DateTime<Utc>>,
}
