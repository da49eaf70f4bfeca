//! In-memory collection that evaluates filters and pipelines the way a
//! document store would.

use std::cmp::Ordering;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eventstores_core::connector::{Collection, Document};
use eventstores_core::cursor::{AggregationResult, ScanResult};
use eventstores_core::error::StoreError;
use eventstores_core::event::ID_FIELD;
use eventstores_core::query::{Condition, Filter, Op, Pipeline, Scalar, SortOrder, Stage};
use serde_json::Value;

/// A collection holding its rows in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryCollection {
    rows: Mutex<Vec<Document>>,
}

impl InMemoryCollection {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every stored row in insertion order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn rows(&self) -> Vec<Document> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl Collection for InMemoryCollection {
    async fn find_one(&self, id: &str) -> Result<Option<Document>, StoreError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|row| row_id(row) == Some(id)).cloned())
    }

    async fn find(&self, filter: &Filter) -> Result<ScanResult, StoreError> {
        let rows = self.rows.lock().unwrap();
        let matched = rows.iter().filter(|row| matches(filter, row)).cloned().collect();
        Ok(ScanResult::from_documents(matched))
    }

    async fn aggregate(&self, pipeline: &Pipeline) -> Result<AggregationResult, StoreError> {
        let mut rows = self.rows.lock().unwrap().clone();
        for stage in &pipeline.stages {
            match stage {
                Stage::Match(filter) => rows.retain(|row| matches(filter, row)),
                Stage::Sort { field, order } => rows.sort_by(|a, b| {
                    let ord = compare_values(a.get(field), b.get(field));
                    match order {
                        SortOrder::Ascending => ord,
                        SortOrder::Descending => ord.reverse(),
                    }
                }),
                Stage::Limit(limit) => rows.truncate(*limit),
            }
        }
        Ok(AggregationResult::from_documents(rows))
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let len = self.rows.lock().unwrap().len();
        Ok(u64::try_from(len).unwrap_or(u64::MAX))
    }

    async fn insert_one(&self, document: Document) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(id) = row_id(&document) {
            if rows.iter().any(|row| row_id(row) == Some(id)) {
                return Err(StoreError::DuplicateEventId(id.to_owned()));
            }
        }
        rows.push(document);
        Ok(())
    }

    async fn insert_many(&self, documents: Vec<Document>) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().unwrap();
        for (i, document) in documents.iter().enumerate() {
            if let Some(id) = row_id(document) {
                let clashes = rows.iter().any(|row| row_id(row) == Some(id))
                    || documents[..i].iter().any(|d| row_id(d) == Some(id));
                if clashes {
                    return Err(StoreError::DuplicateEventId(id.to_owned()));
                }
            }
        }
        rows.extend(documents);
        Ok(())
    }
}

fn row_id(row: &Document) -> Option<&str> {
    row.get(ID_FIELD).and_then(Value::as_str)
}

fn matches(filter: &Filter, row: &Document) -> bool {
    filter
        .conditions
        .iter()
        .all(|condition| condition_holds(condition, row))
}

fn condition_holds(condition: &Condition, row: &Document) -> bool {
    let Some(value) = row.get(&condition.field) else {
        return false;
    };
    let (scalar, accept): (&Scalar, fn(Ordering) -> bool) = match &condition.op {
        Op::Eq(s) => (s, Ordering::is_eq),
        Op::Gte(s) => (s, Ordering::is_ge),
        Op::Lt(s) => (s, Ordering::is_lt),
    };
    compare_to_scalar(value, scalar).is_some_and(accept)
}

fn compare_to_scalar(value: &Value, scalar: &Scalar) -> Option<Ordering> {
    match scalar {
        Scalar::Int(n) => value.as_i64().map(|v| v.cmp(n)),
        Scalar::Text(s) => value.as_str().map(|v| v.cmp(s.as_str())),
        Scalar::Timestamp(t) => value
            .as_str()
            .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
            .map(|v| v.with_timezone(&Utc).cmp(t)),
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            match (x.as_i64(), y.as_i64()) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => x
                    .as_f64()
                    .partial_cmp(&y.as_f64())
                    .unwrap_or(Ordering::Equal),
            }
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}
