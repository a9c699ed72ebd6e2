//! Statement templates generated from a [`TypeSchema`]. Pure string building,
//! no I/O.
//!
//! Placeholders are positional `?`. Their order is the order
//! [`QueryBuilder::insert_params`] and friends hand values to the binder.

use crate::libs::error::ConfigurationError;
use crate::libs::schema::{FieldSchema, TypeSchema};

pub struct QueryBuilder<'a, T> {
    table: String,
    schema: &'a TypeSchema<T>,
}

impl<'a, T> QueryBuilder<'a, T> {
    pub fn new(schema: &'a TypeSchema<T>, namespace: Option<&str>) -> Self {
        Self {
            table: schema.qualified_table(namespace),
            schema,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// `INSERT INTO t (c1, c2) VALUES (?, ?)`
    pub fn insert(&self) -> String {
        let cols = self.columns(&self.schema.fields);
        let placeholders = vec!["?"; self.schema.fields.len()];
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            cols.join(", "),
            placeholders.join(", ")
        )
    }

    /// `UPDATE t SET c = ?, ... WHERE k = ? AND ...`, non-key columns first.
    pub fn update(&self) -> Result<String, ConfigurationError> {
        let sets: Vec<String> = self
            .schema
            .non_key_fields()
            .map(|f| format!("{} = ?", f.column_name))
            .collect();
        if sets.is_empty() {
            return Err(ConfigurationError::NoUpdatableFields {
                type_name: self.schema.type_name,
            });
        }
        Ok(format!(
            "UPDATE {} SET {} WHERE {}",
            self.table,
            sets.join(", "),
            self.key_condition()
        ))
    }

    /// `DELETE FROM t WHERE k = ? AND ...`
    pub fn delete_by_key(&self) -> String {
        format!("DELETE FROM {} WHERE {}", self.table, self.key_condition())
    }

    /// `SELECT * FROM t WHERE k = ? AND ...`
    pub fn select_by_key(&self) -> String {
        format!("SELECT * FROM {} WHERE {}", self.table, self.key_condition())
    }

    pub fn select_all(&self) -> String {
        format!("SELECT * FROM {}", self.table)
    }

    /// `CREATE TABLE IF NOT EXISTS`, so re-issuing it against an existing
    /// table does nothing.
    pub fn create_table(&self) -> String {
        let mut clauses: Vec<String> = self
            .schema
            .fields
            .iter()
            .map(|f| {
                format!(
                    "{} {} {}",
                    f.column_name,
                    f.storage.sql_type(),
                    if f.is_key { "NOT NULL" } else { "NULL" }
                )
            })
            .collect();
        clauses.push(format!(
            "PRIMARY KEY ({})",
            self.columns(&self.schema.key_fields).join(", ")
        ));
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.table,
            clauses.join(", ")
        )
    }

    /// Parameter order of [`insert`](Self::insert).
    pub fn insert_params(&self) -> impl Iterator<Item = &'a FieldSchema<T>> + use<'a, T> {
        self.schema.fields.iter()
    }

    /// Parameter order of [`update`](Self::update): non-key fields, then keys.
    pub fn update_params(&self) -> impl Iterator<Item = &'a FieldSchema<T>> + use<'a, T> {
        self.schema.non_key_fields().chain(self.schema.key_fields.iter())
    }

    /// Parameter order of the key-addressed statements.
    pub fn key_params(&self) -> impl Iterator<Item = &'a FieldSchema<T>> + use<'a, T> {
        self.schema.key_fields.iter()
    }

    fn key_condition(&self) -> String {
        self.schema
            .key_fields
            .iter()
            .map(|f| format!("{} = ?", f.column_name))
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    fn columns<'f>(&self, fields: &'f [FieldSchema<T>]) -> Vec<&'f str> {
        fields.iter().map(|f| f.column_name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::metadata::extract_schema;
    use crate::libs::schema::{Mapped, TypeDescriptor};

    #[derive(Default)]
    struct Employee {
        id: i32,
        name: String,
        position: Option<String>,
    }

    impl Mapped for Employee {
        fn descriptor() -> TypeDescriptor<Self> {
            TypeDescriptor::new("Employee")
                .table("Workers")
                .key("id", |e: &Employee| &e.id, |e| &mut e.id)
                .field("name", |e: &Employee| &e.name, |e| &mut e.name)
                .field("position", |e: &Employee| &e.position, |e| &mut e.position)
        }
    }

    #[derive(Default)]
    struct Visit {
        city_name: String,
        visit_day: i16,
        note: String,
    }

    impl Mapped for Visit {
        fn descriptor() -> TypeDescriptor<Self> {
            TypeDescriptor::new("Visit")
                .table("Visits")
                .key("cityName", |v: &Visit| &v.city_name, |v| &mut v.city_name)
                .field("note", |v: &Visit| &v.note, |v| &mut v.note)
                .key("visitDay", |v: &Visit| &v.visit_day, |v| &mut v.visit_day)
        }
    }

    #[derive(Default)]
    struct Pair {
        origin: i64,
        target: i64,
    }

    impl Mapped for Pair {
        fn descriptor() -> TypeDescriptor<Self> {
            TypeDescriptor::new("Pair")
                .table("Pairs")
                .key("origin", |p: &Pair| &p.origin, |p| &mut p.origin)
                .key("target", |p: &Pair| &p.target, |p| &mut p.target)
        }
    }

    #[test]
    fn insert_lists_every_column() {
        let schema = extract_schema::<Employee>().unwrap();
        let qb = QueryBuilder::new(&schema, None);
        assert_eq!(
            qb.insert(),
            "INSERT INTO Workers (id, name, position) VALUES (?, ?, ?)"
        );
        assert_eq!(qb.insert_params().count(), 3);
    }

    #[test]
    fn update_sets_non_keys_and_filters_on_keys() {
        let schema = extract_schema::<Visit>().unwrap();
        let qb = QueryBuilder::new(&schema, None);
        assert_eq!(
            qb.update().unwrap(),
            "UPDATE Visits SET note = ? WHERE city_name = ? AND visit_day = ?"
        );
        let order: Vec<_> = qb.update_params().map(|f| f.member_name).collect();
        assert_eq!(order, ["note", "cityName", "visitDay"]);
    }

    #[test]
    fn key_statements_and_all_keys_update() {
        let schema = extract_schema::<Pair>().unwrap();
        let qb = QueryBuilder::new(&schema, None);
        assert_eq!(qb.delete_by_key(), "DELETE FROM Pairs WHERE origin = ? AND target = ?");
        assert_eq!(qb.select_by_key(), "SELECT * FROM Pairs WHERE origin = ? AND target = ?");
        assert_eq!(qb.select_all(), "SELECT * FROM Pairs");
        assert_eq!(
            qb.update().unwrap_err(),
            ConfigurationError::NoUpdatableFields { type_name: "Pair" }
        );
    }

    #[test]
    fn create_table_marks_keys_and_primary_key() {
        let schema = extract_schema::<Visit>().unwrap();
        let qb = QueryBuilder::new(&schema, None);
        assert_eq!(
            qb.create_table(),
            "CREATE TABLE IF NOT EXISTS Visits (city_name VARCHAR(100) NOT NULL, \
             note VARCHAR(100) NULL, visit_day SMALLINT NOT NULL, \
             PRIMARY KEY (city_name, visit_day))"
        );
    }

    #[test]
    fn namespace_qualifies_the_table() {
        let schema = extract_schema::<Employee>().unwrap();
        let qb = QueryBuilder::new(&schema, Some("main"));
        assert_eq!(qb.table(), "main.Workers");
        assert_eq!(qb.select_all(), "SELECT * FROM main.Workers");
        let default = Employee::default();
        assert_eq!(default.name, "");
        assert_eq!(default.position, None);
    }
}
