//! Schema model types for database tables, columns, and references.
//!
//! These types provide a vendor-agnostic representation of catalog metadata.
//! A [`TableDefinitionCollection`] is assembled once per introspection call
//! and is immutable afterwards.

use serde::{Deserialize, Serialize};

use crate::error::{DataseedError, Result};
use crate::typemap::{SemanticType, StorageKind};

/// Single-column foreign key reference to another table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyRef {
    /// Referenced schema name.
    pub schema: String,
    /// Referenced table name.
    pub table: String,
    /// Referenced column name.
    pub column: String,
}

/// One database column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// Column name, unique within its table.
    pub name: String,

    /// Vendor-native type name (e.g. "nvarchar").
    pub database_type: String,

    /// Portable value type derived from the native type.
    pub semantic_type: SemanticType,

    /// Portable storage classification derived from the native type.
    pub storage_kind: StorageKind,

    /// Declared maximum length; 0 means unbounded or not applicable.
    pub max_length: i32,

    /// Whether the column accepts NULL.
    pub is_nullable: bool,

    /// Whether the column is an identity column.
    pub is_identity: bool,

    /// Whether the value is assigned by the engine itself (row versioning).
    pub is_auto_generated: bool,

    /// Outgoing single-column foreign key, at most one.
    pub foreign_key: Option<ForeignKeyRef>,
}

impl ColumnDefinition {
    /// Attach a foreign key reference to this column.
    ///
    /// A column can reference at most one target; a second assignment is a
    /// structural error and fails the whole introspection call.
    pub fn set_foreign_key(&mut self, table: &str, reference: ForeignKeyRef) -> Result<()> {
        if self.foreign_key.is_some() {
            return Err(DataseedError::ForeignKeyConflict {
                table: table.to_string(),
                column: self.name.clone(),
            });
        }
        self.foreign_key = Some(reference);
        Ok(())
    }
}

/// One database table with its columns in catalog order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDefinition {
    /// Table name.
    pub name: String,

    /// Schema name.
    pub schema: String,

    /// Fully qualified name per the vendor's quoting convention.
    pub full_name: String,

    /// Column definitions in catalog order.
    pub columns: Vec<ColumnDefinition>,
}

impl TableDefinition {
    /// Create an empty table definition with a precomputed qualified name.
    pub fn new(name: impl Into<String>, schema: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
            full_name: full_name.into(),
            columns: Vec::new(),
        }
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Look up a column by name for mutation.
    pub fn column_mut(&mut self, name: &str) -> Option<&mut ColumnDefinition> {
        self.columns.iter_mut().find(|c| c.name == name)
    }
}

/// Ordered result of one introspection call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableDefinitionCollection {
    tables: Vec<TableDefinition>,
}

impl TableDefinitionCollection {
    pub fn new(tables: Vec<TableDefinition>) -> Self {
        Self { tables }
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TableDefinition> {
        self.tables.iter()
    }

    /// Find a table by schema and name.
    pub fn find(&self, schema: &str, name: &str) -> Option<&TableDefinition> {
        self.tables.iter().find(|t| t.schema == schema && t.name == name)
    }
}

impl IntoIterator for TableDefinitionCollection {
    type Item = TableDefinition;
    type IntoIter = std::vec::IntoIter<TableDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.into_iter()
    }
}

impl<'a> IntoIterator for &'a TableDefinitionCollection {
    type Item = &'a TableDefinition;
    type IntoIter = std::slice::Iter<'a, TableDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.iter()
    }
}

/// Request-time filter for an introspection call.
#[derive(Debug, Clone, Default)]
pub struct GetTableOptions {
    /// Fetch column details, or table names only.
    pub include_columns: bool,

    /// Fetch foreign key references. Requires `include_columns`.
    pub include_foreign_keys: bool,

    /// Restrict to these schemas; `None` means all.
    pub schema_filter: Option<Vec<String>>,

    /// Restrict to these table names; `None` means all.
    pub table_filter: Option<Vec<String>>,

    /// Drop tables in these schemas after assembly.
    pub exclude_schemas: Vec<String>,

    /// Drop these table names after assembly.
    pub exclude_tables: Vec<String>,
}

impl GetTableOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_columns(mut self) -> Self {
        self.include_columns = true;
        self
    }

    pub fn with_foreign_keys(mut self) -> Self {
        self.include_foreign_keys = true;
        self
    }

    pub fn with_schema_filter(mut self, schemas: Vec<String>) -> Self {
        self.schema_filter = Some(schemas);
        self
    }

    pub fn with_table_filter(mut self, tables: Vec<String>) -> Self {
        self.table_filter = Some(tables);
        self
    }

    pub fn with_excluded_schemas(mut self, schemas: Vec<String>) -> Self {
        self.exclude_schemas = schemas;
        self
    }

    pub fn with_excluded_tables(mut self, tables: Vec<String>) -> Self {
        self.exclude_tables = tables;
        self
    }

    /// Check option consistency before issuing any catalog query.
    pub fn validate(&self) -> Result<()> {
        if self.include_foreign_keys && !self.include_columns {
            return Err(DataseedError::Config(
                "include_foreign_keys requires include_columns".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether a fully assembled table passes the post-assembly filters.
    pub fn retains(&self, table: &TableDefinition) -> bool {
        if let Some(schemas) = &self.schema_filter {
            if !schemas.iter().any(|s| s == &table.schema) {
                return false;
            }
        }
        if let Some(names) = &self.table_filter {
            if !names.iter().any(|n| n == &table.name) {
                return false;
            }
        }
        if self.exclude_schemas.iter().any(|s| s == &table.schema) {
            return false;
        }
        if self.exclude_tables.iter().any(|n| n == &table.name) {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str) -> ColumnDefinition {
        ColumnDefinition {
            name: name.to_string(),
            database_type: "int".to_string(),
            semantic_type: SemanticType::I32,
            storage_kind: StorageKind::Int32,
            max_length: 0,
            is_nullable: false,
            is_identity: false,
            is_auto_generated: false,
            foreign_key: None,
        }
    }

    #[test]
    fn test_first_foreign_key_succeeds_second_fails() {
        let mut col = column("CustomerId");
        let fk = ForeignKeyRef {
            schema: "dbo".to_string(),
            table: "Customers".to_string(),
            column: "Id".to_string(),
        };

        col.set_foreign_key("Orders", fk.clone()).unwrap();
        assert_eq!(col.foreign_key.as_ref(), Some(&fk));

        let err = col.set_foreign_key("Orders", fk).unwrap_err();
        assert!(matches!(
            err,
            DataseedError::ForeignKeyConflict { ref table, ref column }
                if table == "Orders" && column == "CustomerId"
        ));
    }

    #[test]
    fn test_column_lookup_by_name() {
        let mut table = TableDefinition::new("Orders", "dbo", "[dbo].[Orders]");
        table.columns.push(column("Id"));
        table.columns.push(column("CustomerId"));

        assert!(table.column("CustomerId").is_some());
        assert!(table.column("customerid").is_none());
    }

    #[test]
    fn test_options_validation() {
        let options = GetTableOptions::new().with_foreign_keys();
        assert!(options.validate().is_err());

        let options = GetTableOptions::new().with_columns().with_foreign_keys();
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_post_assembly_filters() {
        let orders = TableDefinition::new("Orders", "dbo", "[dbo].[Orders]");
        let audit = TableDefinition::new("Audit", "log", "[log].[Audit]");

        let options = GetTableOptions::new().with_schema_filter(vec!["dbo".to_string()]);
        assert!(options.retains(&orders));
        assert!(!options.retains(&audit));

        let options = GetTableOptions::new().with_excluded_tables(vec!["Orders".to_string()]);
        assert!(!options.retains(&orders));
        assert!(options.retains(&audit));
    }
}
