//! Hands out DAOs, creating each mapped type's table the first time it is
//! asked for.

use std::any::TypeId;
use std::collections::HashMap;

use parking_lot::Mutex;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::libs::error::{ConfigurationError, OrmResult};
use crate::libs::metadata::extract_schema;
use crate::libs::migrate::ensure_table;
use crate::libs::orm::Dao;
use crate::libs::schema::Mapped;
use crate::libs::settings::OrmConfig;

/// Remembers which type owns a table and builds DAOs for it.
#[derive(Debug, Clone, Copy)]
struct DaoCreator {
    type_id: TypeId,
    type_name: &'static str,
}

impl DaoCreator {
    fn of<T: Mapped>(type_name: &'static str) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name,
        }
    }

    fn check<T: Mapped>(self, table: &str, type_name: &'static str) -> OrmResult<Self> {
        if self.type_id == TypeId::of::<T>() {
            return Ok(self);
        }
        Err(ConfigurationError::TableAlreadyMapped {
            table: table.to_string(),
            mapped_by: self.type_name,
            type_name,
        }
        .into())
    }

    fn create<'c, T: Mapped>(
        self,
        conn: &'c mut SqliteConnection,
        namespace: Option<String>,
    ) -> OrmResult<Dao<'c, T>> {
        Dao::with_namespace(conn, namespace)
    }
}

/// DAO factory.
///
/// Entries are keyed by qualified table name and live as long as the
/// registry. The cache sits behind a mutex, so one registry can be shared
/// between tasks; each DAO it returns still belongs to the connection it was
/// built over.
#[derive(Debug, Default)]
pub struct DaoRegistry {
    namespace: Option<String>,
    skip_table_creation: bool,
    creators: Mutex<HashMap<String, DaoCreator>>,
}

impl DaoRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &OrmConfig) -> Self {
        Self {
            namespace: config.namespace.clone(),
            skip_table_creation: !config.create_tables,
            creators: Mutex::new(HashMap::new()),
        }
    }

    /// Returns a fresh DAO for `T` bound to `conn`.
    ///
    /// The table tag is checked before the key fields. On the first request
    /// for a table the table is created if missing; later requests reuse the
    /// cached entry and go straight to building the DAO.
    pub async fn dao<'c, T: Mapped>(
        &self,
        conn: &'c mut SqliteConnection,
    ) -> OrmResult<Dao<'c, T>> {
        let schema = extract_schema::<T>()?;
        let table = schema.qualified_table(self.namespace.as_deref());

        let cached = self.creators.lock().get(&table).copied();
        let creator = match cached {
            Some(creator) => creator.check::<T>(&table, schema.type_name)?,
            None => {
                if !self.skip_table_creation {
                    ensure_table(&mut *conn, &schema, self.namespace.as_deref()).await?;
                }
                let creator = *self
                    .creators
                    .lock()
                    .entry(table.clone())
                    .or_insert_with(|| DaoCreator::of::<T>(schema.type_name));
                debug!(table = %table, type_name = schema.type_name, "registered dao creator");
                creator.check::<T>(&table, schema.type_name)?
            }
        };
        creator.create(conn, self.namespace.clone())
    }

    pub fn is_registered(&self, table: &str) -> bool {
        self.creators.lock().contains_key(table)
    }

    pub fn len(&self) -> usize {
        self.creators.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.creators.lock().is_empty()
    }
}
