//! Storage types and the runtime values that move between fields and statements.

use crate::libs::error::ValueError;

/// Column storage vocabulary. A field whose Rust type has no entry here is not
/// persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageType {
    Text,
    Char,
    SmallInt,
    Integer,
    BigInt,
    Float,
    Double,
    Boolean,
}

impl StorageType {
    /// Column type used in `CREATE TABLE`.
    pub fn sql_type(self) -> &'static str {
        match self {
            Self::Text => "VARCHAR(100)",
            Self::Char => "CHAR(1)",
            Self::SmallInt => "SMALLINT",
            Self::Integer => "INT",
            Self::BigInt => "BIGINT",
            Self::Float => "FLOAT",
            Self::Double => "DOUBLE",
            Self::Boolean => "BOOL",
        }
    }
}

/// A single bound parameter or decoded column.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Char(char),
    SmallInt(i16),
    Integer(i32),
    BigInt(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Text(_) => "text",
            Self::Char(_) => "char",
            Self::SmallInt(_) => "smallint",
            Self::Integer(_) => "integer",
            Self::BigInt(_) => "bigint",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::Boolean(_) => "boolean",
        }
    }

    fn mismatch(&self, expected: &'static str) -> ValueError {
        ValueError::Mismatch {
            expected,
            found: self.kind(),
        }
    }
}

/// A Rust type that can live in a column.
///
/// `Option<V>` maps to the same storage type as `V` and carries SQL `NULL`.
pub trait FieldValue: Sized {
    const STORAGE: StorageType;

    fn to_value(&self) -> Value;

    fn from_value(value: Value) -> Result<Self, ValueError>;
}

macro_rules! exact_field_value {
    ($ty:ty, $storage:ident, $variant:ident, $expected:literal) => {
        impl FieldValue for $ty {
            const STORAGE: StorageType = StorageType::$storage;

            fn to_value(&self) -> Value {
                Value::$variant(self.clone())
            }

            fn from_value(value: Value) -> Result<Self, ValueError> {
                match value {
                    Value::$variant(v) => Ok(v),
                    other => Err(other.mismatch($expected)),
                }
            }
        }
    };
}

exact_field_value!(String, Text, Text, "text");
exact_field_value!(char, Char, Char, "char");
exact_field_value!(i16, SmallInt, SmallInt, "smallint");
exact_field_value!(i32, Integer, Integer, "integer");
exact_field_value!(i64, BigInt, BigInt, "bigint");
exact_field_value!(f32, Float, Float, "float");
exact_field_value!(f64, Double, Double, "double");
exact_field_value!(bool, Boolean, Boolean, "boolean");

impl FieldValue for i8 {
    const STORAGE: StorageType = StorageType::SmallInt;

    fn to_value(&self) -> Value {
        Value::SmallInt(i16::from(*self))
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::SmallInt(v) => i8::try_from(v).map_err(|_| ValueError::OutOfRange {
                value: i64::from(v),
                target: "i8",
            }),
            other => Err(other.mismatch("smallint")),
        }
    }
}

impl<V: FieldValue> FieldValue for Option<V> {
    const STORAGE: StorageType = V::STORAGE;

    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(None),
            other => V::from_value(other).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_variants_convert_back() {
        assert_eq!(String::from_value(Value::Text("Moscow".into())).unwrap(), "Moscow");
        assert_eq!(i32::from_value(Value::Integer(60000)).unwrap(), 60000);
        assert!(bool::from_value(Value::Boolean(true)).unwrap());
    }

    #[test]
    fn no_coercion_between_variants() {
        let err = i32::from_value(Value::BigInt(1)).unwrap_err();
        assert_eq!(
            err,
            ValueError::Mismatch {
                expected: "integer",
                found: "bigint"
            }
        );
    }

    #[test]
    fn null_only_fits_options() {
        assert_eq!(Option::<bool>::from_value(Value::Null).unwrap(), None);
        assert_eq!(Option::<bool>::STORAGE, StorageType::Boolean);
        assert!(bool::from_value(Value::Null).is_err());
        assert_eq!(Some(7_i64).to_value(), Value::BigInt(7));
    }

    #[test]
    fn i8_is_range_checked() {
        assert_eq!(i8::from_value(Value::SmallInt(-5)).unwrap(), -5);
        assert!(matches!(
            i8::from_value(Value::SmallInt(300)),
            Err(ValueError::OutOfRange { value: 300, .. })
        ));
    }
}
