//! Tagged-struct ORM: derive a table and a CRUD DAO from a struct's
//! declaration.
//!
//! ```ignore
//! use tagged_orm::*;
//!
//! #[tagged(table_name = "Workers")]
//! #[derive(Debug, Default)]
//! pub struct Employee {
//!     #[tagged(key)]
//!     pub id: i32,
//!     pub name: String,
//! }
//!
//! let registry = DaoRegistry::new();
//! let mut dao = registry.dao::<Employee>(&mut conn).await?;
//! dao.insert(&Employee { id: 1, name: "Frank".into() }).await?;
//! ```

extern crate self as tagged_orm;

pub mod libs;

pub use libs::*;
pub use tagged_orm_derive::tagged;
