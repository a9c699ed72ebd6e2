//! Error types surfaced by every layer of the ORM.

use thiserror::Error;

/// Result alias used across the crate.
pub type OrmResult<T> = Result<T, OrmError>;

/// Crate-wide error.
///
/// Nothing inside the crate recovers from these; each one is handed back to
/// the caller of the operation that produced it.
#[derive(Error, Debug)]
pub enum OrmError {
    /// The mapped type is declared in a way no DAO can be built for.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// The storage engine rejected a statement.
    #[error("statement execution failed: {0}")]
    Execution(#[from] sqlx::Error),

    /// A statement touched a number of rows its operation does not allow.
    #[error("consistency violation: {0}")]
    Consistency(#[from] ConsistencyViolation),

    /// A result column has no field to land in.
    #[error("column `{column}` does not resolve to a field of `{type_name}`")]
    UnknownColumn {
        type_name: &'static str,
        column: String,
    },

    /// A stored value does not fit the field it resolved to.
    #[error("column `{column}`: {source}")]
    Value {
        column: String,
        #[source]
        source: ValueError,
    },

    /// Settings could not be loaded.
    #[error("settings error: {0}")]
    Settings(#[from] config::ConfigError),
}

impl OrmError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    pub fn is_consistency(&self) -> bool {
        matches!(self, Self::Consistency(_))
    }
}

/// Raised while building a DAO; fixing it means fixing the type declaration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("type `{type_name}` is not tagged with a table name")]
    NoTableTag { type_name: &'static str },

    #[error("type `{type_name}` has no key fields")]
    NoKeyFields { type_name: &'static str },

    #[error("type `{type_name}` has no non-key fields to update")]
    NoUpdatableFields { type_name: &'static str },

    #[error("table `{table}` is already mapped by `{mapped_by}`, not `{type_name}`")]
    TableAlreadyMapped {
        table: String,
        mapped_by: &'static str,
        type_name: &'static str,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsistencyViolation {
    /// Update and delete must touch exactly one row.
    #[error("{operation} on `{table}` affected {affected} rows, expected exactly 1")]
    AffectedRows {
        operation: &'static str,
        table: String,
        affected: u64,
    },

    /// A key lookup matched more than one row.
    #[error("key lookup on `{table}` matched {matched} rows")]
    MultipleRows { table: String, matched: usize },
}

/// A value could not be converted into a field's Rust type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    #[error("expected {expected}, found {found}")]
    Mismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("{value} is out of range for {target}")]
    OutOfRange { value: i64, target: &'static str },

    #[error("expected a single character, found {0:?}")]
    NotAChar(String),

    /// The stored value could not be read as the column's storage type.
    #[error("cannot decode stored value: {0}")]
    Decode(String),
}
