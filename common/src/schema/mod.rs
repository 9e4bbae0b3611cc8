pub mod document;
pub mod introspect;

pub use document::{
    CatalogColumn, CatalogForeignKey, ColumnInfo, ColumnRef, ForeignKeyRef, SchemaDocument,
    TableInfo,
};
pub use introspect::load_schema_definitions;
