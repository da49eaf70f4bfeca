//! `PostgreSQL` implementation of the `Collection` trait.

use async_trait::async_trait;
use eventstores_core::connector::{Collection, Document};
use eventstores_core::cursor::{AggregationResult, RowStream, ScanResult};
use eventstores_core::error::StoreError;
use eventstores_core::event::ID_FIELD;
use eventstores_core::query::{Filter, Pipeline, Scalar};
use futures::{StreamExt, TryStreamExt};
use sqlx::PgPool;
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::QueryScalar;
use sqlx::types::Json;
use tracing::debug;

use crate::schema::quote_ident;
use crate::sql::{self, SqlQuery};

type DocumentQuery<'q> = QueryScalar<'q, Postgres, Json<Document>, PgArguments>;

/// One partition table.
#[derive(Debug, Clone)]
pub struct PgCollection {
    pool: PgPool,
    table: String,
}

impl PgCollection {
    /// Creates a handle for the table `name`. The table must already exist.
    #[must_use]
    pub fn new(pool: PgPool, name: &str) -> Self {
        Self {
            pool,
            table: quote_ident(name),
        }
    }

    fn stream(&self, query: SqlQuery) -> RowStream {
        let pool = self.pool.clone();
        async_stream::stream! {
            debug!(sql = %query.sql, "streaming rows");
            let mut rows = bind_all(sqlx::query_scalar(&query.sql), &query.binds).fetch(&pool);
            loop {
                match rows.try_next().await {
                    Ok(Some(Json(document))) => {
                        yield Ok(document);
                    }
                    Ok(None) => break,
                    Err(e) => {
                        yield Err(query_error(e));
                        break;
                    }
                }
            }
        }
        .boxed()
    }

    async fn insert<'e, E>(&self, executor: E, document: &Document) -> Result<(), StoreError>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let id = document
            .get(ID_FIELD)
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| StoreError::BackendWrite(format!("document has no string {ID_FIELD}")))?;
        let sql = format!("INSERT INTO {} (id, doc) VALUES ($1, $2)", self.table);
        sqlx::query(&sql)
            .bind(id)
            .bind(Json(document))
            .execute(executor)
            .await
            .map_err(|e| write_error(e, id))?;
        Ok(())
    }
}

#[async_trait]
impl Collection for PgCollection {
    async fn find_one(&self, id: &str) -> Result<Option<Document>, StoreError> {
        let sql = format!("SELECT doc FROM {} WHERE id = $1", self.table);
        let row: Option<Json<Document>> = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;
        Ok(row.map(|Json(document)| document))
    }

    async fn find(&self, filter: &Filter) -> Result<ScanResult, StoreError> {
        Ok(ScanResult::new(self.stream(sql::scan(&self.table, filter))))
    }

    async fn aggregate(&self, pipeline: &Pipeline) -> Result<AggregationResult, StoreError> {
        let query = sql::aggregate(&self.table, pipeline)?;
        Ok(AggregationResult::new(self.stream(query)))
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table);
        let count: i64 = sqlx::query_scalar(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(query_error)?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn insert_one(&self, document: Document) -> Result<(), StoreError> {
        self.insert(&self.pool, &document).await
    }

    async fn insert_many(&self, documents: Vec<Document>) -> Result<(), StoreError> {
        if documents.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await.map_err(unavailable)?;
        for document in &documents {
            self.insert(&mut *tx, document).await?;
        }
        tx.commit()
            .await
            .map_err(|e| StoreError::BackendWrite(e.to_string()))?;
        Ok(())
    }
}

fn bind_all<'q>(mut query: DocumentQuery<'q>, binds: &[Scalar]) -> DocumentQuery<'q> {
    for bind in binds {
        query = match bind {
            Scalar::Int(n) => query.bind(*n),
            Scalar::Text(s) => query.bind(s.clone()),
            Scalar::Timestamp(t) => query.bind(*t),
        };
    }
    query
}

fn is_connection_error(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
    )
}

fn unavailable(err: sqlx::Error) -> StoreError {
    StoreError::BackendUnavailable(err.to_string())
}

fn query_error(err: sqlx::Error) -> StoreError {
    if is_connection_error(&err) {
        unavailable(err)
    } else {
        StoreError::BackendQuery(err.to_string())
    }
}

fn write_error(err: sqlx::Error, id: &str) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return StoreError::DuplicateEventId(id.to_owned());
        }
    }
    if is_connection_error(&err) {
        return unavailable(err);
    }
    StoreError::BackendWrite(err.to_string())
}
