//! Test connectors — `StoreConnector` implementations for tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use eventstores_core::connector::{Collection, CollectionNaming, Document, StoreConnector};
use eventstores_core::cursor::{AggregationResult, ScanResult};
use eventstores_core::error::StoreError;
use eventstores_core::query::{Filter, Pipeline};

use crate::memory::InMemoryCollection;

/// A connector backed by in-memory collections, one per collection name.
///
/// By default every `(scope, type)` pair gets its own collection.
#[derive(Debug)]
pub struct InMemoryConnector {
    naming: CollectionNaming,
    collections: Mutex<HashMap<String, Arc<InMemoryCollection>>>,
}

impl InMemoryConnector {
    /// Creates a connector isolating every `(scope, type)` pair.
    #[must_use]
    pub fn new() -> Self {
        Self::with_naming(CollectionNaming::ScopeAndType)
    }

    /// Creates a connector that maps partitions to collections with `naming`.
    #[must_use]
    pub fn with_naming(naming: CollectionNaming) -> Self {
        Self {
            naming,
            collections: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the collection for a partition, creating it if needed.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn collection(&self, scope: &str, event_type: &str) -> Arc<InMemoryCollection> {
        let name = self.naming.collection_name(scope, event_type);
        self.collections
            .lock()
            .unwrap()
            .entry(name)
            .or_default()
            .clone()
    }
}

impl Default for InMemoryConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StoreConnector for InMemoryConnector {
    async fn connect(
        &self,
        scope: &str,
        event_type: &str,
    ) -> Result<Arc<dyn Collection>, StoreError> {
        Ok(self.collection(scope, event_type))
    }
}

/// A connector whose every `connect` call fails. Useful for testing
/// "backend down" paths.
#[derive(Debug)]
pub struct UnavailableConnector;

#[async_trait]
impl StoreConnector for UnavailableConnector {
    async fn connect(
        &self,
        _scope: &str,
        _event_type: &str,
    ) -> Result<Arc<dyn Collection>, StoreError> {
        Err(StoreError::BackendUnavailable("connection refused".into()))
    }
}

/// A connector whose collections for the listed types fail every read and
/// write; other types behave like `InMemoryConnector`.
#[derive(Debug)]
pub struct FaultyConnector {
    failing_types: HashSet<String>,
    healthy: InMemoryConnector,
}

impl FaultyConnector {
    /// Creates a connector failing operations on `failing_types`.
    pub fn new<'a>(failing_types: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            failing_types: failing_types.into_iter().map(str::to_owned).collect(),
            healthy: InMemoryConnector::new(),
        }
    }
}

#[async_trait]
impl StoreConnector for FaultyConnector {
    async fn connect(
        &self,
        scope: &str,
        event_type: &str,
    ) -> Result<Arc<dyn Collection>, StoreError> {
        if self.failing_types.contains(event_type) {
            return Ok(Arc::new(FailingCollection));
        }
        self.healthy.connect(scope, event_type).await
    }
}

#[derive(Debug)]
struct FailingCollection;

#[async_trait]
impl Collection for FailingCollection {
    async fn find_one(&self, _id: &str) -> Result<Option<Document>, StoreError> {
        Err(StoreError::BackendQuery("query failed".into()))
    }

    async fn find(&self, _filter: &Filter) -> Result<ScanResult, StoreError> {
        Err(StoreError::BackendQuery("query failed".into()))
    }

    async fn aggregate(&self, _pipeline: &Pipeline) -> Result<AggregationResult, StoreError> {
        Err(StoreError::BackendQuery("query failed".into()))
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Err(StoreError::BackendQuery("query failed".into()))
    }

    async fn insert_one(&self, _document: Document) -> Result<(), StoreError> {
        Err(StoreError::BackendWrite("write failed".into()))
    }

    async fn insert_many(&self, _documents: Vec<Document>) -> Result<(), StoreError> {
        Err(StoreError::BackendWrite("write failed".into()))
    }
}
