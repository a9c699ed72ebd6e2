//! Turns result rows back into mapped instances.

use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Decode, Row, Sqlite, Type};

use crate::libs::error::{OrmError, OrmResult, ValueError};
use crate::libs::naming::to_member_case;
use crate::libs::schema::{FieldSchema, Mapped, TypeSchema};
use crate::libs::value::{StorageType, Value};

/// One-pass iterator over materialized rows.
///
/// Columns are resolved against the schema when the first row is read. A
/// column that resolves to no field ends the iteration with
/// [`OrmError::UnknownColumn`].
pub struct Materialized<'s, T> {
    schema: &'s TypeSchema<T>,
    rows: std::vec::IntoIter<SqliteRow>,
    plan: Option<Vec<(usize, &'s FieldSchema<T>)>>,
}

pub fn materialize<T: Mapped>(
    schema: &TypeSchema<T>,
    rows: Vec<SqliteRow>,
) -> Materialized<'_, T> {
    Materialized {
        schema,
        rows: rows.into_iter(),
        plan: None,
    }
}

impl<T: Mapped> Iterator for Materialized<'_, T> {
    type Item = OrmResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.rows.next()?;
        if self.plan.is_none() {
            match resolve_columns(self.schema, &row) {
                Ok(plan) => self.plan = Some(plan),
                Err(e) => {
                    self.rows = Vec::new().into_iter();
                    return Some(Err(e));
                }
            }
        }
        let plan = self.plan.as_deref()?;
        Some(build(plan, &row))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

fn resolve_columns<'s, T>(
    schema: &'s TypeSchema<T>,
    row: &SqliteRow,
) -> OrmResult<Vec<(usize, &'s FieldSchema<T>)>> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(index, column)| {
            let member = to_member_case(column.name());
            schema
                .field_by_member(&member)
                .map(|field| (index, field))
                .ok_or_else(|| OrmError::UnknownColumn {
                    type_name: schema.type_name,
                    column: column.name().to_string(),
                })
        })
        .collect()
}

fn build<T: Mapped>(plan: &[(usize, &FieldSchema<T>)], row: &SqliteRow) -> OrmResult<T> {
    let mut instance = T::default();
    for (index, field) in plan {
        let value = decode(row, *index, field)?;
        field
            .set(&mut instance, value)
            .map_err(|source| OrmError::Value {
                column: field.column_name.clone(),
                source,
            })?;
    }
    Ok(instance)
}

/// Reads a column as the field's storage type. SQL `NULL` becomes
/// [`Value::Null`] whatever the storage type.
///
/// Integers are read as `i64` and narrowed, so a stored value too wide for
/// the column type surfaces as [`ValueError::OutOfRange`].
fn decode<T>(row: &SqliteRow, index: usize, field: &FieldSchema<T>) -> OrmResult<Value> {
    let value = match field.storage {
        StorageType::Text => read::<String>(row, index).map(|v| v.map(Value::Text)),
        StorageType::Char => read::<String>(row, index)
            .and_then(|v| v.map(single_char).transpose())
            .map(|v| v.map(Value::Char)),
        StorageType::SmallInt => read::<i64>(row, index)
            .and_then(|v| v.map(|n| narrow::<i16>(n, "i16")).transpose())
            .map(|v| v.map(Value::SmallInt)),
        StorageType::Integer => read::<i64>(row, index)
            .and_then(|v| v.map(|n| narrow::<i32>(n, "i32")).transpose())
            .map(|v| v.map(Value::Integer)),
        StorageType::BigInt => read::<i64>(row, index).map(|v| v.map(Value::BigInt)),
        StorageType::Float => read::<f32>(row, index).map(|v| v.map(Value::Float)),
        StorageType::Double => read::<f64>(row, index).map(|v| v.map(Value::Double)),
        StorageType::Boolean => read::<bool>(row, index).map(|v| v.map(Value::Boolean)),
    };
    value
        .map(|v| v.unwrap_or(Value::Null))
        .map_err(|source| OrmError::Value {
            column: field.column_name.clone(),
            source,
        })
}

fn read<'r, V>(row: &'r SqliteRow, index: usize) -> Result<Option<V>, ValueError>
where
    V: Decode<'r, Sqlite> + Type<Sqlite>,
{
    row.try_get::<Option<V>, _>(index)
        .map_err(|e| ValueError::Decode(e.to_string()))
}

fn narrow<N: TryFrom<i64>>(value: i64, target: &'static str) -> Result<N, ValueError> {
    N::try_from(value).map_err(|_| ValueError::OutOfRange { value, target })
}

fn single_char(text: String) -> Result<char, ValueError> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(ValueError::NotAChar(text)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_char_rejects_empty_and_long_text() {
        assert_eq!(single_char("x".into()).unwrap(), 'x');
        assert_eq!(
            single_char("".into()).unwrap_err(),
            ValueError::NotAChar(String::new())
        );
        assert!(single_char("xy".into()).is_err());
    }

    #[test]
    fn narrow_reports_the_target_type() {
        assert_eq!(narrow::<i32>(60_000, "i32").unwrap(), 60_000);
        assert_eq!(
            narrow::<i32>(5_000_000_000, "i32").unwrap_err(),
            ValueError::OutOfRange {
                value: 5_000_000_000,
                target: "i32"
            }
        );
        assert!(narrow::<i16>(40_000, "i16").is_err());
    }
}
