//! Settings, layered from defaults, a `.env` file and `TAGGED_ORM_*`
//! environment variables.

use std::collections::HashMap;

use config::{Config, Environment};
use serde::Deserialize;
use sqlx::{Connection, SqliteConnection};
use tracing::{debug, info};

use crate::libs::error::OrmResult;

const ENV_PREFIX: &str = "TAGGED_ORM";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrmConfig {
    /// SQLite URL, e.g. `sqlite://cities.db` or `sqlite::memory:`.
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Schema qualifier prepended to every table name.
    #[serde(default)]
    pub namespace: Option<String>,

    /// When false, tables are assumed to exist already.
    #[serde(default = "default_create_tables")]
    pub create_tables: bool,
}

fn default_database_url() -> String {
    "sqlite::memory:".to_string()
}

fn default_create_tables() -> bool {
    true
}

impl Default for OrmConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            namespace: None,
            create_tables: default_create_tables(),
        }
    }
}

impl OrmConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Self::default()
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Loads `.env` if present, then reads `TAGGED_ORM_DATABASE_URL`,
    /// `TAGGED_ORM_NAMESPACE` and `TAGGED_ORM_CREATE_TABLES`.
    pub fn from_env() -> OrmResult<Self> {
        if let Err(e) = dotenvy::dotenv() {
            debug!("no .env file loaded: {}", e);
        }
        Self::from_source(None)
    }

    /// Same as [`from_env`](Self::from_env) but reads variables from `vars`
    /// when given instead of the process environment.
    pub fn from_source(vars: Option<HashMap<String, String>>) -> OrmResult<Self> {
        let settings = Config::builder()
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .source(vars),
            )
            .build()?;
        let config: Self = settings.try_deserialize()?;
        info!(
            database_url = %config.database_url,
            namespace = ?config.namespace,
            "orm configuration loaded"
        );
        Ok(config)
    }

    /// Opens a single connection to the configured database.
    pub async fn connect(&self) -> OrmResult<SqliteConnection> {
        info!(database_url = %self.database_url, "connecting");
        Ok(SqliteConnection::connect(&self.database_url).await?)
    }
}
