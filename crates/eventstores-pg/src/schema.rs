//! Partition table schema.

/// Quotes an identifier for use in SQL.
///
/// `PostgreSQL` truncates identifiers longer than 63 bytes, so very long
/// scope/type combinations may collide.
#[must_use]
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// SQL creating the table and index for one partition.
#[must_use]
pub fn create_collection_table(name: &str) -> String {
    let table = quote_ident(name);
    let index = quote_ident(&format!("{name}_aggregate_id_idx"));
    format!(
        r"
CREATE TABLE IF NOT EXISTS {table} (
    seq BIGSERIAL NOT NULL,
    id  TEXT PRIMARY KEY,
    doc JSONB NOT NULL
);

CREATE INDEX IF NOT EXISTS {index}
    ON {table} ((doc->>'aggregateID'), seq);
"
    )
}
