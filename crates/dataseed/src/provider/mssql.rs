//! SQL Server catalog client and vendor profile.
//!
//! Catalog queries run over `INFORMATION_SCHEMA` for tables and columns and
//! over `sys.foreign_key_columns` for references. All three queries carry
//! their own ORDER BY; result order is the collection order.

use async_trait::async_trait;
use tiberius::Client;
use tokio::net::TcpStream;
use tokio_util::compat::Compat;

use crate::error::Result;
use crate::provider::{
    CatalogClient, ColumnRow, ReferenceRow, SchemaQueryProvider, TableRow, VendorProfile,
};
use crate::typemap::mssql_mapping;

/// Tiberius connection type used by the catalog client.
pub type MssqlConnection = Client<Compat<TcpStream>>;

const TABLES_QUERY: &str = r#"
    SELECT
        t.TABLE_SCHEMA,
        t.TABLE_NAME
    FROM INFORMATION_SCHEMA.TABLES t
    WHERE t.TABLE_TYPE = 'BASE TABLE'
    ORDER BY t.TABLE_SCHEMA, t.TABLE_NAME
"#;

const COLUMNS_QUERY: &str = r#"
    SELECT
        c.TABLE_NAME,
        c.TABLE_SCHEMA,
        c.COLUMN_NAME,
        c.DATA_TYPE,
        CAST(c.CHARACTER_MAXIMUM_LENGTH AS INT),
        CASE WHEN c.IS_NULLABLE = 'YES' THEN 1 ELSE 0 END,
        ISNULL(COLUMNPROPERTY(OBJECT_ID(c.TABLE_SCHEMA + '.' + c.TABLE_NAME), c.COLUMN_NAME, 'IsIdentity'), 0)
    FROM INFORMATION_SCHEMA.COLUMNS c
    JOIN INFORMATION_SCHEMA.TABLES t
        ON t.TABLE_SCHEMA = c.TABLE_SCHEMA AND t.TABLE_NAME = c.TABLE_NAME
    WHERE t.TABLE_TYPE = 'BASE TABLE'
    ORDER BY c.TABLE_SCHEMA, c.TABLE_NAME, c.ORDINAL_POSITION
"#;

const REFERENCES_QUERY: &str = r#"
    SELECT
        pt.name AS referencing_table,
        ps.name AS referencing_schema,
        pc.name AS referencing_column,
        rs.name AS referenced_schema,
        rt.name AS referenced_table,
        rc.name AS referenced_column
    FROM sys.foreign_key_columns fkc
    JOIN sys.tables pt ON fkc.parent_object_id = pt.object_id
    JOIN sys.schemas ps ON pt.schema_id = ps.schema_id
    JOIN sys.columns pc ON fkc.parent_object_id = pc.object_id AND fkc.parent_column_id = pc.column_id
    JOIN sys.tables rt ON fkc.referenced_object_id = rt.object_id
    JOIN sys.schemas rs ON rt.schema_id = rs.schema_id
    JOIN sys.columns rc ON fkc.referenced_object_id = rc.object_id AND fkc.referenced_column_id = rc.column_id
    ORDER BY ps.name, pt.name, fkc.constraint_column_id
"#;

/// SQL Server vendor profile.
pub static PROFILE: VendorProfile = VendorProfile {
    name: "mssql",
    tables_query: TABLES_QUERY,
    columns_query: COLUMNS_QUERY,
    references_query: REFERENCES_QUERY,
    mapping: mssql_mapping(),
    auto_generated_types: &["rowversion", "timestamp"],
    quote: quote_full_name,
};

/// Quote a (schema, table) pair with brackets, doubling closing brackets.
pub fn quote_full_name(schema: &str, table: &str) -> String {
    format!("[{}].[{}]", schema.replace(']', "]]"), table.replace(']', "]]"))
}

/// Catalog client over a borrowed tiberius connection.
pub struct MssqlCatalog<'a> {
    client: &'a mut MssqlConnection,
}

impl<'a> MssqlCatalog<'a> {
    pub fn new(client: &'a mut MssqlConnection) -> Self {
        Self { client }
    }

    async fn query_rows(&mut self, sql: &str) -> Result<Vec<tiberius::Row>> {
        let stream = self.client.simple_query(sql).await?;
        Ok(stream.into_first_result().await?)
    }
}

#[async_trait]
impl CatalogClient for MssqlCatalog<'_> {
    async fn fetch_tables(&mut self, sql: &str) -> Result<Vec<TableRow>> {
        let rows = self.query_rows(sql).await?;
        Ok(rows
            .into_iter()
            .map(|row| TableRow {
                schema: row.get::<&str, _>(0).unwrap_or_default().to_string(),
                name: row.get::<&str, _>(1).unwrap_or_default().to_string(),
            })
            .collect())
    }

    async fn fetch_columns(&mut self, sql: &str) -> Result<Vec<ColumnRow>> {
        let rows = self.query_rows(sql).await?;
        Ok(rows
            .into_iter()
            .map(|row| ColumnRow {
                table: row.get::<&str, _>(0).unwrap_or_default().to_string(),
                schema: row.get::<&str, _>(1).unwrap_or_default().to_string(),
                name: row.get::<&str, _>(2).unwrap_or_default().to_string(),
                native_type: row.get::<&str, _>(3).unwrap_or_default().to_string(),
                max_length: row.get::<i32, _>(4),
                is_nullable: row.get::<i32, _>(5).unwrap_or(0) == 1,
                is_identity: row.get::<i32, _>(6).unwrap_or(0) == 1,
            })
            .collect())
    }

    async fn fetch_references(&mut self, sql: &str) -> Result<Vec<ReferenceRow>> {
        let rows = self.query_rows(sql).await?;
        Ok(rows
            .into_iter()
            .map(|row| ReferenceRow {
                referencing_table: row.get::<&str, _>(0).unwrap_or_default().to_string(),
                referencing_schema: row.get::<&str, _>(1).unwrap_or_default().to_string(),
                referencing_column: row.get::<&str, _>(2).unwrap_or_default().to_string(),
                referenced_schema: row.get::<&str, _>(3).unwrap_or_default().to_string(),
                referenced_table: row.get::<&str, _>(4).unwrap_or_default().to_string(),
                referenced_column: row.get::<&str, _>(5).unwrap_or_default().to_string(),
            })
            .collect())
    }
}

/// Build a schema query provider over a borrowed SQL Server connection.
pub fn provider(client: &mut MssqlConnection) -> SchemaQueryProvider<MssqlCatalog<'_>> {
    SchemaQueryProvider::new(MssqlCatalog::new(client), PROFILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bracket_quoting() {
        assert_eq!(quote_full_name("dbo", "Orders"), "[dbo].[Orders]");
        assert_eq!(quote_full_name("dbo", "Weird]Name"), "[dbo].[Weird]]Name]");
    }

    #[test]
    fn test_profile_markers() {
        assert!(PROFILE.auto_generated_types.contains(&"rowversion"));
        assert!(PROFILE.auto_generated_types.contains(&"timestamp"));
    }
}
