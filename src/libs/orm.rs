//! The per-type DAO: binds instance values into generated statements and runs
//! them, one statement per call.

use std::fmt;

use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments};
use sqlx::SqliteConnection;
use tracing::{debug, warn};

use crate::libs::error::{ConsistencyViolation, OrmResult};
use crate::libs::materializer::materialize;
use crate::libs::metadata::extract_schema;
use crate::libs::query_builder::QueryBuilder;
use crate::libs::schema::{FieldSchema, Mapped, TypeSchema};
use crate::libs::value::Value;

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// Data access object for one mapped type over one borrowed connection.
///
/// The DAO never begins or ends a transaction. Build it over a transaction
/// (`&mut *tx`) to group calls.
pub struct Dao<'c, T> {
    schema: TypeSchema<T>,
    conn: &'c mut SqliteConnection,
    namespace: Option<String>,
}

impl<T> fmt::Debug for Dao<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dao")
            .field("schema", &self.schema)
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl<'c, T: Mapped> Dao<'c, T> {
    /// Builds a DAO without touching the database. The schema is derived
    /// afresh on every call.
    pub fn new(conn: &'c mut SqliteConnection) -> OrmResult<Self> {
        Self::with_namespace(conn, None)
    }

    pub fn with_namespace(
        conn: &'c mut SqliteConnection,
        namespace: Option<String>,
    ) -> OrmResult<Self> {
        Ok(Self {
            schema: extract_schema::<T>()?,
            conn,
            namespace,
        })
    }

    pub fn schema(&self) -> &TypeSchema<T> {
        &self.schema
    }

    /// Table name as used in statements, namespace included.
    pub fn table(&self) -> String {
        self.schema.qualified_table(self.namespace.as_deref())
    }

    pub async fn insert(&mut self, instance: &T) -> OrmResult<()> {
        let qb = QueryBuilder::new(&self.schema, self.namespace.as_deref());
        let sql = qb.insert();
        debug!(table = %qb.table(), sql = %sql, "insert");
        bind_fields(sqlx::query(&sql), qb.insert_params(), instance)
            .execute(&mut *self.conn)
            .await
            .map_err(|e| {
                warn!(table = %qb.table(), error = %e, "insert failed");
                e
            })?;
        Ok(())
    }

    /// Writes every non-key field of `instance` to the row its keys address.
    /// Anything other than exactly one affected row is an error.
    pub async fn update(&mut self, instance: &T) -> OrmResult<()> {
        let qb = QueryBuilder::new(&self.schema, self.namespace.as_deref());
        let sql = qb.update()?;
        debug!(table = %qb.table(), sql = %sql, "update");
        let result = bind_fields(sqlx::query(&sql), qb.update_params(), instance)
            .execute(&mut *self.conn)
            .await?;
        expect_one_row("update", qb.table(), result.rows_affected())
    }

    /// Deletes the row addressed by the key fields of `key`. Non-key fields
    /// of `key` are ignored.
    pub async fn delete_by_key(&mut self, key: &T) -> OrmResult<()> {
        let qb = QueryBuilder::new(&self.schema, self.namespace.as_deref());
        let sql = qb.delete_by_key();
        debug!(table = %qb.table(), sql = %sql, "delete by key");
        let result = bind_fields(sqlx::query(&sql), qb.key_params(), key)
            .execute(&mut *self.conn)
            .await?;
        expect_one_row("delete", qb.table(), result.rows_affected())
    }

    /// `None` when no row matches.
    pub async fn select_by_key(&mut self, key: &T) -> OrmResult<Option<T>> {
        let qb = QueryBuilder::new(&self.schema, self.namespace.as_deref());
        let sql = qb.select_by_key();
        debug!(table = %qb.table(), sql = %sql, "select by key");
        let rows = bind_fields(sqlx::query(&sql), qb.key_params(), key)
            .fetch_all(&mut *self.conn)
            .await?;
        if rows.len() > 1 {
            return Err(ConsistencyViolation::MultipleRows {
                table: qb.table().to_string(),
                matched: rows.len(),
            }
            .into());
        }
        materialize(&self.schema, rows).next().transpose()
    }

    pub async fn select_all(&mut self) -> OrmResult<Vec<T>> {
        let qb = QueryBuilder::new(&self.schema, self.namespace.as_deref());
        let sql = qb.select_all();
        debug!(table = %qb.table(), sql = %sql, "select all");
        let rows = sqlx::query(&sql).fetch_all(&mut *self.conn).await?;
        materialize(&self.schema, rows).collect()
    }
}

fn expect_one_row(operation: &'static str, table: &str, affected: u64) -> OrmResult<()> {
    if affected == 1 {
        return Ok(());
    }
    warn!(table = %table, operation, affected, "unexpected affected row count");
    Err(ConsistencyViolation::AffectedRows {
        operation,
        table: table.to_string(),
        affected,
    }
    .into())
}

/// Binds each field's current value, in iteration order, to the next
/// positional parameter.
fn bind_fields<'q, 'f, T: 'static>(
    mut query: SqliteQuery<'q>,
    fields: impl Iterator<Item = &'f FieldSchema<T>>,
    source: &T,
) -> SqliteQuery<'q> {
    for field in fields {
        query = bind_value(query, field.get(source));
    }
    query
}

fn bind_value(query: SqliteQuery<'_>, value: Value) -> SqliteQuery<'_> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Text(v) => query.bind(v),
        Value::Char(v) => query.bind(v.to_string()),
        Value::SmallInt(v) => query.bind(v),
        Value::Integer(v) => query.bind(v),
        Value::BigInt(v) => query.bind(v),
        Value::Float(v) => query.bind(v),
        Value::Double(v) => query.bind(v),
        Value::Boolean(v) => query.bind(v),
    }
}
