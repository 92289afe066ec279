//! Database-facing metadata: catalog queries, schema rows and connection strings.

pub(crate) mod dsn;
pub mod metadata;

pub use metadata::{CatalogQuery, ColumnInfo, SchemaRow};
