//! # dataseed
//!
//! Schema introspection and spreadsheet-driven test data helper generation.
//!
//! This library reads relational schema metadata (tables, columns, foreign
//! keys, type mappings) from a live database connection and, separately,
//! tabular data from spreadsheet workbooks, to generate test-data-seeding
//! source files:
//!
//! - **Schema introspection** via one shared algorithm parameterized by a
//!   vendor profile (SQL Server over tiberius, PostgreSQL over
//!   tokio-postgres)
//! - **Portable type mapping** from vendor type names to a semantic type and
//!   storage kind
//! - **Binding models** built from column metadata embedded in workbook
//!   header comments
//! - **Value serialization** of raw cell text into typed source literals
//!
//! ## Example
//!
//! ```rust,no_run
//! use dataseed::{provider::mssql, GetTableOptions};
//!
//! # async fn introspect(client: &mut dataseed::provider::mssql::MssqlConnection) -> dataseed::Result<()> {
//! let options = GetTableOptions::new().with_columns().with_foreign_keys();
//! let tables = mssql::provider(client).get_tables(&options).await?;
//! for table in &tables {
//!     println!("{} ({} columns)", table.full_name, table.columns.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod generator;
pub mod manage;
pub mod provider;
pub mod schema;
pub mod typemap;
pub mod workbook;

// Re-exports for convenient access
pub use config::{Flavor, GeneratorConfig};
pub use error::{DataseedError, Result};
pub use generator::{serialize_value, HelperGenerator, HelperTemplates, Renderer, WorkbookOpener};
pub use manage::DbManagementProvider;
pub use provider::{SchemaQueryProvider, VendorProfile};
pub use schema::{
    ColumnDefinition, ForeignKeyRef, GetTableOptions, TableDefinition, TableDefinitionCollection,
};
pub use typemap::{SemanticType, StorageKind, TypeMapping};
pub use workbook::{ColumnBindingModel, TableBindingModel, Workbook, Worksheet};
