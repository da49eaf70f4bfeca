//! Translation of filters and pipelines into parameterized SQL over JSONB.

use eventstores_core::error::StoreError;
use eventstores_core::query::{Condition, Filter, Op, Pipeline, Scalar, SortOrder, Stage};

/// A SQL statement and its positional parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlQuery {
    /// Statement text using `$1`, `$2`, ... placeholders.
    pub sql: String,
    /// Parameters in placeholder order.
    pub binds: Vec<Scalar>,
}

/// Builds a natural-order scan of `table` (already quoted).
#[must_use]
pub fn scan(table: &str, filter: &Filter) -> SqlQuery {
    let mut binds = Vec::new();
    let mut sql = format!("SELECT doc FROM {table}");
    push_where(&mut sql, &filter.conditions, &mut binds);
    sql.push_str(" ORDER BY seq");
    SqlQuery { sql, binds }
}

/// Builds a single SELECT for a pipeline.
///
/// Match stages are combined, the last sort wins and the smallest limit
/// applies. Ties in the sort key keep insertion order.
///
/// # Errors
///
/// Returns `StoreError::BackendQuery` if a match or sort stage follows a
/// limit, which cannot be expressed as one statement.
pub fn aggregate(table: &str, pipeline: &Pipeline) -> Result<SqlQuery, StoreError> {
    let mut conditions: Vec<&Condition> = Vec::new();
    let mut sort: Option<(&str, SortOrder)> = None;
    let mut limit: Option<usize> = None;

    for stage in &pipeline.stages {
        match stage {
            Stage::Match(_) | Stage::Sort { .. } if limit.is_some() => {
                return Err(StoreError::BackendQuery(
                    "pipeline stages after a limit are not supported".into(),
                ));
            }
            Stage::Match(filter) => conditions.extend(&filter.conditions),
            Stage::Sort { field, order } => sort = Some((field.as_str(), *order)),
            Stage::Limit(n) => limit = Some(limit.map_or(*n, |current| current.min(*n))),
        }
    }

    let mut binds = Vec::new();
    let mut sql = format!("SELECT doc FROM {table}");
    push_where(&mut sql, conditions, &mut binds);
    match sort {
        Some((field, order)) => {
            let direction = match order {
                SortOrder::Ascending => "ASC",
                SortOrder::Descending => "DESC",
            };
            sql.push_str(&format!(" ORDER BY doc->{} {direction}, seq", literal(field)));
        }
        None => sql.push_str(" ORDER BY seq"),
    }
    if let Some(n) = limit {
        // PostgreSQL rejects a LIMIT beyond bigint.
        let n = i64::try_from(n).unwrap_or(i64::MAX);
        sql.push_str(&format!(" LIMIT {n}"));
    }
    Ok(SqlQuery { sql, binds })
}

fn push_where<'a>(
    sql: &mut String,
    conditions: impl IntoIterator<Item = &'a Condition>,
    binds: &mut Vec<Scalar>,
) {
    let mut clauses = Vec::new();
    for condition in conditions {
        let (operator, scalar) = match &condition.op {
            Op::Eq(s) => ("=", s),
            Op::Gte(s) => (">=", s),
            Op::Lt(s) => ("<", s),
        };
        let text = format!("doc->>{}", literal(&condition.field));
        let column = match scalar {
            Scalar::Int(_) => format!("({text})::bigint"),
            Scalar::Text(_) => text,
            Scalar::Timestamp(_) => format!("({text})::timestamptz"),
        };
        binds.push(scalar.clone());
        clauses.push(format!("{column} {operator} ${}", binds.len()));
    }
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
}

fn literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_without_conditions_orders_by_insertion() {
        let query = scan("\"T\"", &Filter::all());

        assert_eq!(query.sql, "SELECT doc FROM \"T\" ORDER BY seq");
        assert!(query.binds.is_empty());
    }

    #[test]
    fn test_scan_binds_conditions_in_order() {
        let filter = Filter::all()
            .eq("aggregateID", Scalar::Text("a-1".into()))
            .gte("_version", Scalar::Int(5));

        let query = scan("\"T\"", &filter);

        assert_eq!(
            query.sql,
            "SELECT doc FROM \"T\" WHERE doc->>'aggregateID' = $1 \
             AND (doc->>'_version')::bigint >= $2 ORDER BY seq"
        );
        assert_eq!(
            query.binds,
            vec![Scalar::Text("a-1".into()), Scalar::Int(5)]
        );
    }

    #[test]
    fn test_aggregate_builds_sorted_limited_select() {
        let pipeline = Pipeline::new()
            .matching(Filter::all().eq("aggregateID", Scalar::Text("a".into())))
            .sort("_version", SortOrder::Descending)
            .limit(1);

        let query = aggregate("\"T\"", &pipeline).unwrap();

        assert_eq!(
            query.sql,
            "SELECT doc FROM \"T\" WHERE doc->>'aggregateID' = $1 \
             ORDER BY doc->'_version' DESC, seq LIMIT 1"
        );
    }

    #[test]
    fn test_aggregate_keeps_smallest_limit() {
        let pipeline = Pipeline::new().limit(10).limit(3).limit(7);

        let query = aggregate("\"T\"", &pipeline).unwrap();

        assert!(query.sql.ends_with("LIMIT 3"));
    }

    #[test]
    fn test_aggregate_clamps_limit_to_bigint() {
        let pipeline = Pipeline::new().limit(usize::MAX);

        let query = aggregate("\"T\"", &pipeline).unwrap();

        assert!(query.sql.ends_with(&format!("LIMIT {}", i64::MAX)));
    }

    #[test]
    fn test_aggregate_rejects_match_after_limit() {
        let pipeline = Pipeline::new().limit(1).matching(Filter::all());

        assert!(matches!(
            aggregate("\"T\"", &pipeline),
            Err(StoreError::BackendQuery(_))
        ));
    }

    #[test]
    fn test_field_names_are_escaped() {
        let query = scan("\"T\"", &Filter::all().eq("it's", Scalar::Int(1)));

        assert!(query.sql.contains("doc->>'it''s'"));
    }

    #[test]
    fn test_timestamps_cast_to_timestamptz() {
        let now = chrono::Utc::now();
        let query = scan("\"T\"", &Filter::all().lt("_createdAt", Scalar::Timestamp(now)));

        assert!(query.sql.contains("(doc->>'_createdAt')::timestamptz < $1"));
    }
}
