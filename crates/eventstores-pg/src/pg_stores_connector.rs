//! `PostgreSQL` implementation of the `StoreConnector` trait.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use eventstores_core::connector::{Collection, CollectionNaming, StoreConnector};
use eventstores_core::error::StoreError;
use sqlx::PgPool;
use tracing::{debug, info};

use crate::pg_collection::PgCollection;
use crate::schema::create_collection_table;

/// SQLSTATE for `duplicate_table`.
const DUPLICATE_TABLE: &str = "42P07";

/// PostgreSQL-backed store connector.
///
/// Owns the connection pool. Partition tables are created on first use and
/// remembered, so repeated `connect` calls only build a handle.
#[derive(Debug)]
pub struct PgStoresConnector {
    pool: PgPool,
    naming: CollectionNaming,
    ensured: Mutex<HashSet<String>>,
}

impl PgStoresConnector {
    /// Creates a new `PgStoresConnector`.
    #[must_use]
    pub fn new(pool: PgPool, naming: CollectionNaming) -> Self {
        Self {
            pool,
            naming,
            ensured: Mutex::new(HashSet::new()),
        }
    }

    fn is_ensured(&self, name: &str) -> bool {
        self.ensured
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(name)
    }

    async fn ensure_table(&self, name: &str) -> Result<(), StoreError> {
        if self.is_ensured(name) {
            return Ok(());
        }
        let result = sqlx::raw_sql(&create_collection_table(name))
            .execute(&self.pool)
            .await;
        match result {
            Ok(_) => info!(table = name, "ensured partition table"),
            // Concurrent `CREATE ... IF NOT EXISTS` can still collide.
            Err(sqlx::Error::Database(db))
                if db.is_unique_violation() || db.code().as_deref() == Some(DUPLICATE_TABLE) =>
            {
                debug!(table = name, "partition table created concurrently");
            }
            Err(e) => return Err(StoreError::BackendUnavailable(e.to_string())),
        }
        self.ensured
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_owned());
        Ok(())
    }
}

#[async_trait]
impl StoreConnector for PgStoresConnector {
    async fn connect(
        &self,
        scope: &str,
        event_type: &str,
    ) -> Result<Arc<dyn Collection>, StoreError> {
        let name = self.naming.collection_name(scope, event_type);
        self.ensure_table(&name).await?;
        Ok(Arc::new(PgCollection::new(self.pool.clone(), &name)))
    }
}
