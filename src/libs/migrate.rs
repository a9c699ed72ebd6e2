//! Makes sure a mapped type has a table to live in.

use sqlx::SqliteConnection;
use tracing::{info, warn};

use crate::libs::error::OrmResult;
use crate::libs::query_builder::QueryBuilder;
use crate::libs::schema::TypeSchema;

/// Creates the table for `schema` if it does not exist yet.
///
/// An existing table is left exactly as it is, even when its columns no
/// longer match the schema. Such mismatches show up as execution failures on
/// later statements.
pub async fn ensure_table<T>(
    conn: &mut SqliteConnection,
    schema: &TypeSchema<T>,
    namespace: Option<&str>,
) -> OrmResult<()> {
    let qb = QueryBuilder::new(schema, namespace);
    let sql = qb.create_table();
    info!(table = %qb.table(), "ensuring table exists");
    sqlx::query(&sql).execute(&mut *conn).await.map_err(|e| {
        warn!(table = %qb.table(), error = %e, "table creation failed");
        e
    })?;
    Ok(())
}
