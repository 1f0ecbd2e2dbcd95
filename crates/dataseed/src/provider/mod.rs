//! Schema query providers.
//!
//! One introspection algorithm is shared by every vendor. A vendor contributes
//! a [`VendorProfile`] (the three catalog query texts, its type mapping table,
//! its quoting rule, and its auto-generated type markers) plus a
//! [`CatalogClient`] implementation that executes those queries against the
//! driver's row type and decodes them into the fixed-shape records below.
//!
//! The connection behind a catalog client is borrowed; the provider never
//! opens, closes, or retries it.

pub mod mssql;
pub mod postgres;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{DataseedError, Result};
use crate::schema::{
    ColumnDefinition, ForeignKeyRef, GetTableOptions, TableDefinition, TableDefinitionCollection,
};
use crate::typemap::TypeMapping;

/// One row of the tables catalog query.
#[derive(Debug, Clone)]
pub struct TableRow {
    pub schema: String,
    pub name: String,
}

/// One row of the columns catalog query.
#[derive(Debug, Clone)]
pub struct ColumnRow {
    pub table: String,
    pub schema: String,
    pub name: String,
    pub native_type: String,
    pub max_length: Option<i32>,
    pub is_nullable: bool,
    pub is_identity: bool,
}

/// One row of the foreign key catalog query.
#[derive(Debug, Clone)]
pub struct ReferenceRow {
    pub referencing_table: String,
    pub referencing_schema: String,
    pub referencing_column: String,
    pub referenced_schema: String,
    pub referenced_table: String,
    pub referenced_column: String,
}

/// Vendor capability descriptor.
///
/// Everything that differs between supported vendors lives here; the assembly
/// algorithm itself is shared.
#[derive(Debug, Clone, Copy)]
pub struct VendorProfile {
    /// Vendor name for logging.
    pub name: &'static str,

    /// Catalog query returning one row per base table.
    pub tables_query: &'static str,

    /// Catalog query returning one row per column across all base tables.
    pub columns_query: &'static str,

    /// Catalog query returning one row per single-column foreign key.
    pub references_query: &'static str,

    /// Native type name to portable pair mapping.
    pub mapping: TypeMapping,

    /// Native type names whose values the engine assigns itself.
    pub auto_generated_types: &'static [&'static str],

    /// Fully-qualified-name quoting rule: (schema, table) to quoted text.
    pub quote: fn(&str, &str) -> String,
}

/// Executes the vendor's catalog queries and decodes driver rows into the
/// fixed-shape records.
#[async_trait]
pub trait CatalogClient: Send {
    async fn fetch_tables(&mut self, sql: &str) -> Result<Vec<TableRow>>;

    async fn fetch_columns(&mut self, sql: &str) -> Result<Vec<ColumnRow>>;

    async fn fetch_references(&mut self, sql: &str) -> Result<Vec<ReferenceRow>>;
}

/// Vendor-parameterized schema query provider.
pub struct SchemaQueryProvider<C> {
    catalog: C,
    profile: VendorProfile,
}

impl<C: CatalogClient> SchemaQueryProvider<C> {
    pub fn new(catalog: C, profile: VendorProfile) -> Self {
        Self { catalog, profile }
    }

    /// Vendor profile this provider was built with.
    pub fn profile(&self) -> &VendorProfile {
        &self.profile
    }

    /// Introspect the catalog and return the assembled, filtered tables.
    ///
    /// Column and reference data are fetched before the table list so every
    /// table can be populated in one pass. Any failure aborts the whole call;
    /// a partially populated collection is never returned.
    pub async fn get_tables(&mut self, options: &GetTableOptions) -> Result<TableDefinitionCollection> {
        options.validate()?;

        let columns = if options.include_columns {
            Some(self.catalog.fetch_columns(self.profile.columns_query).await?)
        } else {
            None
        };

        let references = if options.include_foreign_keys {
            Some(self.catalog.fetch_references(self.profile.references_query).await?)
        } else {
            None
        };

        let tables = self.catalog.fetch_tables(self.profile.tables_query).await?;

        let collection = assemble(tables, columns, references, &self.profile, options)?;
        info!(
            "Extracted {} tables from {} catalog",
            collection.len(),
            self.profile.name
        );
        Ok(collection)
    }
}

/// Assemble the schema model from decoded catalog rows.
///
/// Pure with respect to the database: all catalog state arrives as arguments,
/// which keeps the algorithm testable without a live connection.
fn assemble(
    table_rows: Vec<TableRow>,
    column_rows: Option<Vec<ColumnRow>>,
    reference_rows: Option<Vec<ReferenceRow>>,
    profile: &VendorProfile,
    options: &GetTableOptions,
) -> Result<TableDefinitionCollection> {
    let mut tables = Vec::with_capacity(table_rows.len());

    for row in table_rows {
        let full_name = (profile.quote)(&row.schema, &row.name);
        let mut table = TableDefinition::new(row.name, row.schema, full_name);

        if let Some(columns) = &column_rows {
            assign_columns(&mut table, columns, profile);
        }
        if let Some(references) = &reference_rows {
            assign_references(&mut table, references)?;
        }

        tables.push(table);
    }

    let retained: Vec<TableDefinition> = tables.into_iter().filter(|t| options.retains(t)).collect();
    Ok(TableDefinitionCollection::new(retained))
}

/// Attach the column rows belonging to one table, in catalog order.
fn assign_columns(table: &mut TableDefinition, columns: &[ColumnRow], profile: &VendorProfile) {
    for row in columns.iter().filter(|c| c.table == table.name && c.schema == table.schema) {
        let (semantic_type, storage_kind) = profile.mapping.map(&row.native_type);
        let is_auto_generated = profile
            .auto_generated_types
            .iter()
            .any(|t| row.native_type.eq_ignore_ascii_case(t));

        table.columns.push(ColumnDefinition {
            name: row.name.clone(),
            database_type: row.native_type.clone(),
            semantic_type,
            storage_kind,
            max_length: row.max_length.unwrap_or(0),
            is_nullable: row.is_nullable,
            is_identity: row.is_identity,
            is_auto_generated,
            foreign_key: None,
        });
    }

    debug!("Assembled {} columns for {}", table.columns.len(), table.full_name);
}

/// Attach the foreign key rows belonging to one table.
///
/// The referencing column must already be assembled; a miss means the catalog
/// and the column query disagree and the whole call fails.
fn assign_references(table: &mut TableDefinition, references: &[ReferenceRow]) -> Result<()> {
    let table_name = table.name.clone();
    let table_schema = table.schema.clone();
    let matching = references
        .iter()
        .filter(|r| r.referencing_table == table_name && r.referencing_schema == table_schema);

    for reference in matching {
        let table_name = table.name.clone();
        let column = table
            .column_mut(&reference.referencing_column)
            .ok_or_else(|| DataseedError::ColumnNotFound {
                table: table_name.clone(),
                column: reference.referencing_column.clone(),
            })?;

        column.set_foreign_key(
            &table_name,
            ForeignKeyRef {
                schema: reference.referenced_schema.clone(),
                table: reference.referenced_table.clone(),
                column: reference.referenced_column.clone(),
            },
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_row(schema: &str, name: &str) -> TableRow {
        TableRow {
            schema: schema.to_string(),
            name: name.to_string(),
        }
    }

    fn column_row(table: &str, name: &str, native_type: &str) -> ColumnRow {
        ColumnRow {
            table: table.to_string(),
            schema: "dbo".to_string(),
            name: name.to_string(),
            native_type: native_type.to_string(),
            max_length: None,
            is_nullable: false,
            is_identity: false,
        }
    }

    fn customers_orders_catalog() -> (Vec<TableRow>, Vec<ColumnRow>, Vec<ReferenceRow>) {
        let tables = vec![table_row("dbo", "Customers"), table_row("dbo", "Orders")];
        let columns = vec![
            ColumnRow {
                is_identity: true,
                ..column_row("Customers", "Id", "int")
            },
            ColumnRow {
                max_length: Some(50),
                ..column_row("Customers", "Name", "nvarchar")
            },
            ColumnRow {
                is_identity: true,
                ..column_row("Orders", "Id", "int")
            },
            column_row("Orders", "CustomerId", "int"),
        ];
        let references = vec![ReferenceRow {
            referencing_table: "Orders".to_string(),
            referencing_schema: "dbo".to_string(),
            referencing_column: "CustomerId".to_string(),
            referenced_schema: "dbo".to_string(),
            referenced_table: "Customers".to_string(),
            referenced_column: "Id".to_string(),
        }];
        (tables, columns, references)
    }

    #[test]
    fn test_customers_orders_assembly() {
        let (tables, columns, references) = customers_orders_catalog();
        let options = GetTableOptions::new().with_columns().with_foreign_keys();

        let collection =
            assemble(tables, Some(columns), Some(references), &mssql::PROFILE, &options).unwrap();

        assert_eq!(collection.len(), 2);

        let customers = collection.find("dbo", "Customers").unwrap();
        assert_eq!(customers.full_name, "[dbo].[Customers]");
        assert!(customers.column("Id").unwrap().is_identity);
        assert_eq!(customers.column("Name").unwrap().max_length, 50);

        let orders = collection.find("dbo", "Orders").unwrap();
        let fk = orders.column("CustomerId").unwrap().foreign_key.as_ref().unwrap();
        assert_eq!(fk.schema, "dbo");
        assert_eq!(fk.table, "Customers");
        assert_eq!(fk.column, "Id");
    }

    #[test]
    fn test_every_foreign_key_targets_an_assembled_table() {
        let (tables, columns, references) = customers_orders_catalog();
        let options = GetTableOptions::new().with_columns().with_foreign_keys();

        let collection =
            assemble(tables, Some(columns), Some(references), &mssql::PROFILE, &options).unwrap();

        for table in &collection {
            for column in &table.columns {
                if let Some(fk) = &column.foreign_key {
                    let target = collection.find(&fk.schema, &fk.table).unwrap();
                    assert!(target.column(&fk.column).is_some());
                }
            }
        }
    }

    #[test]
    fn test_names_only_leaves_columns_empty() {
        let (tables, _, _) = customers_orders_catalog();
        let options = GetTableOptions::new();

        let collection = assemble(tables, None, None, &mssql::PROFILE, &options).unwrap();

        assert_eq!(collection.len(), 2);
        for table in &collection {
            assert!(table.columns.is_empty());
        }
    }

    #[test]
    fn test_reference_to_missing_column_aborts() {
        let (tables, columns, mut references) = customers_orders_catalog();
        references[0].referencing_column = "NoSuchColumn".to_string();
        let options = GetTableOptions::new().with_columns().with_foreign_keys();

        let err =
            assemble(tables, Some(columns), Some(references), &mssql::PROFILE, &options).unwrap_err();

        assert!(matches!(
            err,
            DataseedError::ColumnNotFound { ref table, ref column }
                if table == "Orders" && column == "NoSuchColumn"
        ));
    }

    #[test]
    fn test_duplicate_reference_aborts() {
        let (tables, columns, mut references) = customers_orders_catalog();
        references.push(references[0].clone());
        let options = GetTableOptions::new().with_columns().with_foreign_keys();

        let err =
            assemble(tables, Some(columns), Some(references), &mssql::PROFILE, &options).unwrap_err();

        assert!(matches!(err, DataseedError::ForeignKeyConflict { .. }));
    }

    #[test]
    fn test_schema_and_table_filters_apply_after_assembly() {
        let tables = vec![
            table_row("dbo", "Customers"),
            table_row("dbo", "Orders"),
            table_row("audit", "Changes"),
        ];

        let options = GetTableOptions::new().with_schema_filter(vec!["dbo".to_string()]);
        let collection = assemble(tables.clone(), None, None, &mssql::PROFILE, &options).unwrap();
        assert_eq!(collection.len(), 2);
        assert!(collection.find("audit", "Changes").is_none());

        let options = GetTableOptions::new().with_excluded_tables(vec!["Orders".to_string()]);
        let collection = assemble(tables, None, None, &mssql::PROFILE, &options).unwrap();
        assert_eq!(collection.len(), 2);
        assert!(collection.find("dbo", "Orders").is_none());
    }

    #[test]
    fn test_catalog_order_is_preserved() {
        let tables = vec![
            table_row("dbo", "Zeta"),
            table_row("dbo", "Alpha"),
            table_row("dbo", "Mid"),
        ];
        let options = GetTableOptions::new();

        let collection = assemble(tables, None, None, &mssql::PROFILE, &options).unwrap();
        let names: Vec<&str> = collection.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["Zeta", "Alpha", "Mid"]);
    }

    #[test]
    fn test_rowversion_column_is_auto_generated() {
        let tables = vec![table_row("dbo", "Products")];
        let columns = vec![
            column_row("Products", "Id", "int"),
            column_row("Products", "Version", "rowversion"),
        ];
        let options = GetTableOptions::new().with_columns();

        let collection = assemble(tables, Some(columns), None, &mssql::PROFILE, &options).unwrap();
        let products = collection.find("dbo", "Products").unwrap();

        assert!(!products.column("Id").unwrap().is_auto_generated);
        assert!(products.column("Version").unwrap().is_auto_generated);
    }
}
