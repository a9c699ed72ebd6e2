pub mod error;
pub mod materializer;
pub mod metadata;
pub mod migrate;
pub mod naming;
pub mod orm;
pub mod query_builder;
pub mod registry;
pub mod schema;
pub mod settings;
pub mod value;

// Re-export them for easier access from the crate root
pub use error::*;
pub use materializer::*;
pub use metadata::*;
pub use migrate::*;
pub use naming::*;
pub use orm::*;
pub use query_builder::*;
pub use registry::*;
pub use schema::*;
pub use settings::*;
pub use value::*;
