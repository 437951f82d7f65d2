//! Live-schema introspection from the SQL Server catalog.

use conform_schema::{ColumnDescription, Literal, SchemaSet, TableDescription, dialect};
use tracing::debug;

use crate::client::SqlClient;
use crate::{Error, Result};

/// One round-trip for every base table's columns, in catalog ordinal order.
const COLUMNS_QUERY: &str = "\
    SELECT c.TABLE_NAME, c.COLUMN_NAME, c.DATA_TYPE, c.COLUMN_DEFAULT, c.IS_NULLABLE, c.CHARACTER_MAXIMUM_LENGTH \
    FROM INFORMATION_SCHEMA.COLUMNS c \
    JOIN INFORMATION_SCHEMA.TABLES t \
      ON t.TABLE_SCHEMA = c.TABLE_SCHEMA AND t.TABLE_NAME = c.TABLE_NAME \
    WHERE t.TABLE_TYPE = 'BASE TABLE' \
    ORDER BY c.TABLE_NAME, c.ORDINAL_POSITION";

/// Read every base table currently present into a [`SchemaSet`], from a
/// single bulk catalog query.
///
/// Recovered per column: name, native type (canonicalized through the dialect
/// type map, see [`dialect::canonical_catalog_type`]) and default-value text
/// (normalized, kept as [`Literal::Raw`]). Key membership (primary, unique,
/// foreign) plus index membership and check predicates are not recovered in
/// this pass; they default to `false`/`None` so the shape stays uniform with
/// model-derived descriptions. Nullability is present in the row but not part
/// of the description.
pub async fn introspect_schema(client: &mut SqlClient) -> Result<SchemaSet> {
    let stream = client
        .simple_query(COLUMNS_QUERY)
        .await
        .map_err(Error::Connection)?;
    let rows = stream.into_first_result().await.map_err(Error::Connection)?;

    let mut schema = SchemaSet::new();
    for row in rows {
        let table = row.get::<&str, _>(0).unwrap_or_default();
        let column = row.get::<&str, _>(1).unwrap_or_default();
        let data_type = row.get::<&str, _>(2).unwrap_or_default();
        let default = row.get::<&str, _>(3);
        let char_max_len = row.get::<i32, _>(5);

        let entry = schema
            .tables
            .entry(table.to_string())
            .or_insert_with(|| TableDescription {
                name: table.to_string(),
                columns: Vec::new(),
            });

        entry.columns.push(ColumnDescription {
            name: column.to_string(),
            native_type: dialect::canonical_catalog_type(data_type, char_max_len),
            is_primary_key: false,
            is_unique: false,
            is_indexed: false,
            foreign_key: None,
            default_value: default.map(|d| Literal::Raw(dialect::normalize_default(d))),
            check_constraint: None,
        });
    }

    debug!(tables = schema.tables.len(), "introspected live schema");
    Ok(schema)
}
