//! Declarative type descriptors and the schemas derived from them.

use std::fmt;
use std::sync::Arc;

use crate::libs::error::ValueError;
use crate::libs::value::{FieldValue, StorageType, Value};

type Getter<T> = Arc<dyn Fn(&T) -> Value + Send + Sync>;
type Setter<T> = Arc<dyn Fn(&mut T, Value) -> Result<(), ValueError> + Send + Sync>;

/// Getter/setter pair for one field of `T`.
pub struct Accessor<T> {
    get: Getter<T>,
    set: Setter<T>,
}

impl<T> Clone for Accessor<T> {
    fn clone(&self) -> Self {
        Self {
            get: Arc::clone(&self.get),
            set: Arc::clone(&self.set),
        }
    }
}

impl<T: 'static> Accessor<T> {
    pub fn new<V: FieldValue + 'static>(get: fn(&T) -> &V, get_mut: fn(&mut T) -> &mut V) -> Self {
        Self {
            get: Arc::new(move |target: &T| get(target).to_value()),
            set: Arc::new(move |target: &mut T, value: Value| -> Result<(), ValueError> {
                *get_mut(target) = V::from_value(value)?;
                Ok(())
            }),
        }
    }

    pub fn get(&self, target: &T) -> Value {
        (self.get)(target)
    }

    pub fn set(&self, target: &mut T, value: Value) -> Result<(), ValueError> {
        (self.set)(target, value)
    }

    /// Re-roots the accessor on a type `D` that embeds a `T`.
    fn lift<D: 'static>(self, outer: fn(&D) -> &T, outer_mut: fn(&mut D) -> &mut T) -> Accessor<D> {
        let get = self.get;
        let set = self.set;
        Accessor {
            get: Arc::new(move |target: &D| get(outer(target))),
            set: Arc::new(move |target: &mut D, value: Value| set(outer_mut(target), value)),
        }
    }
}

/// One declared field, persisted or not.
pub struct FieldDescriptor<T> {
    /// Member-style name, e.g. `cityName`.
    pub member_name: &'static str,
    pub rust_type: &'static str,
    pub key: bool,
    /// `None` when the declared type has no storage mapping.
    pub storage: Option<StorageType>,
    pub accessor: Option<Accessor<T>>,
}

impl<T> fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("member_name", &self.member_name)
            .field("rust_type", &self.rust_type)
            .field("key", &self.key)
            .field("storage", &self.storage)
            .finish()
    }
}

/// Static description of a mapped type: its table tag, its own fields and the
/// ancestor it extends.
///
/// ```ignore
/// TypeDescriptor::new("Employee")
///     .table("Workers")
///     .key("id", |e: &Employee| &e.id, |e| &mut e.id)
///     .field("name", |e: &Employee| &e.name, |e| &mut e.name)
/// ```
pub struct TypeDescriptor<T> {
    type_name: &'static str,
    table_name: Option<&'static str>,
    fields: Vec<FieldDescriptor<T>>,
    base: Option<Box<TypeDescriptor<T>>>,
}

impl<T: 'static> TypeDescriptor<T> {
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            table_name: None,
            fields: Vec::new(),
            base: None,
        }
    }

    pub fn table(mut self, table_name: &'static str) -> Self {
        self.table_name = Some(table_name);
        self
    }

    pub fn field<V: FieldValue + 'static>(
        self,
        member_name: &'static str,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> Self {
        self.push::<V>(member_name, false, get, get_mut)
    }

    pub fn key<V: FieldValue + 'static>(
        self,
        member_name: &'static str,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> Self {
        self.push::<V>(member_name, true, get, get_mut)
    }

    /// Records a field whose type cannot be stored. It is kept in the
    /// descriptor and skipped by extraction.
    pub fn unmapped(mut self, member_name: &'static str, rust_type: &'static str) -> Self {
        self.fields.push(FieldDescriptor {
            member_name,
            rust_type,
            key: false,
            storage: None,
            accessor: None,
        });
        self
    }

    pub fn extends(mut self, base: TypeDescriptor<T>) -> Self {
        self.base = Some(Box::new(base));
        self
    }

    /// Moves the whole descriptor chain onto a type `D` that embeds a `T`.
    /// Used to inherit an ancestor's fields.
    pub fn lift<D: 'static>(
        self,
        outer: fn(&D) -> &T,
        outer_mut: fn(&mut D) -> &mut T,
    ) -> TypeDescriptor<D> {
        TypeDescriptor {
            type_name: self.type_name,
            table_name: self.table_name,
            fields: self
                .fields
                .into_iter()
                .map(|f| FieldDescriptor {
                    member_name: f.member_name,
                    rust_type: f.rust_type,
                    key: f.key,
                    storage: f.storage,
                    accessor: f.accessor.map(|a| a.lift(outer, outer_mut)),
                })
                .collect(),
            base: self.base.map(|b| Box::new(b.lift(outer, outer_mut))),
        }
    }

    fn push<V: FieldValue + 'static>(
        mut self,
        member_name: &'static str,
        key: bool,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> Self {
        self.fields.push(FieldDescriptor {
            member_name,
            rust_type: std::any::type_name::<V>(),
            key,
            storage: Some(V::STORAGE),
            accessor: Some(Accessor::new(get, get_mut)),
        });
        self
    }
}

impl<T> TypeDescriptor<T> {
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn table_name(&self) -> Option<&'static str> {
        self.table_name
    }

    /// Fields declared on this type only, in declaration order.
    pub fn own_fields(&self) -> &[FieldDescriptor<T>] {
        &self.fields
    }

    pub fn base(&self) -> Option<&TypeDescriptor<T>> {
        self.base.as_deref()
    }

    /// This type followed by each ancestor, most-derived first.
    pub fn lineage(&self) -> impl Iterator<Item = &TypeDescriptor<T>> {
        std::iter::successors(Some(self), |d| d.base())
    }
}

/// A type that can be persisted through a [`Dao`](crate::Dao).
///
/// `Default` is the factory used to build fresh instances during
/// materialization.
pub trait Mapped: Default + 'static {
    fn descriptor() -> TypeDescriptor<Self>;
}

/// A persisted field.
pub struct FieldSchema<T> {
    pub member_name: &'static str,
    pub column_name: String,
    pub storage: StorageType,
    pub is_key: bool,
    pub(crate) accessor: Accessor<T>,
}

impl<T> Clone for FieldSchema<T> {
    fn clone(&self) -> Self {
        Self {
            member_name: self.member_name,
            column_name: self.column_name.clone(),
            storage: self.storage,
            is_key: self.is_key,
            accessor: self.accessor.clone(),
        }
    }
}

impl<T> fmt::Debug for FieldSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSchema")
            .field("member_name", &self.member_name)
            .field("column_name", &self.column_name)
            .field("storage", &self.storage)
            .field("is_key", &self.is_key)
            .finish()
    }
}

impl<T: 'static> FieldSchema<T> {
    pub fn get(&self, target: &T) -> Value {
        self.accessor.get(target)
    }

    pub fn set(&self, target: &mut T, value: Value) -> Result<(), ValueError> {
        self.accessor.set(target, value)
    }
}

/// Everything the generator, binder and materializer need about a type.
///
/// `fields` order is the single ordering used for columns, parameters and
/// materialization. `key_fields` keeps that order.
pub struct TypeSchema<T> {
    pub type_name: &'static str,
    pub table_name: &'static str,
    pub fields: Vec<FieldSchema<T>>,
    pub key_fields: Vec<FieldSchema<T>>,
}

impl<T> Clone for TypeSchema<T> {
    fn clone(&self) -> Self {
        Self {
            type_name: self.type_name,
            table_name: self.table_name,
            fields: self.fields.clone(),
            key_fields: self.key_fields.clone(),
        }
    }
}

impl<T> fmt::Debug for TypeSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeSchema")
            .field("type_name", &self.type_name)
            .field("table_name", &self.table_name)
            .field("fields", &self.fields)
            .field("key_fields", &self.key_fields)
            .finish()
    }
}

impl<T> TypeSchema<T> {
    pub fn non_key_fields(&self) -> impl Iterator<Item = &FieldSchema<T>> {
        self.fields.iter().filter(|f| !f.is_key)
    }

    /// First field with the given member name, derived type before ancestors.
    pub fn field_by_member(&self, member_name: &str) -> Option<&FieldSchema<T>> {
        self.fields.iter().find(|f| f.member_name == member_name)
    }

    /// Table name as it appears in statements.
    pub fn qualified_table(&self, namespace: Option<&str>) -> String {
        match namespace {
            Some(ns) if !ns.is_empty() => format!("{}.{}", ns, self.table_name),
            _ => self.table_name.to_string(),
        }
    }
}
