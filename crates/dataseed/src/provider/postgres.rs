//! PostgreSQL catalog client and vendor profile.
//!
//! Tables and columns come from `information_schema`; single-column foreign
//! keys come from `pg_constraint`. System schemas are excluded at the query
//! level since callers never seed into them.

use async_trait::async_trait;
use tokio_postgres::Client;

use crate::error::Result;
use crate::provider::{
    CatalogClient, ColumnRow, ReferenceRow, SchemaQueryProvider, TableRow, VendorProfile,
};
use crate::typemap::postgres_mapping;

const TABLES_QUERY: &str = r#"
    SELECT table_schema, table_name
    FROM information_schema.tables
    WHERE table_type = 'BASE TABLE'
      AND table_schema NOT IN ('pg_catalog', 'information_schema')
    ORDER BY table_schema, table_name
"#;

const COLUMNS_QUERY: &str = r#"
    SELECT
        c.table_name,
        c.table_schema,
        c.column_name,
        c.data_type,
        c.character_maximum_length::int4,
        (c.is_nullable = 'YES'),
        (c.is_identity = 'YES' OR COALESCE(c.column_default, '') LIKE 'nextval(%')
    FROM information_schema.columns c
    JOIN information_schema.tables t
        ON t.table_schema = c.table_schema AND t.table_name = c.table_name
    WHERE t.table_type = 'BASE TABLE'
      AND c.table_schema NOT IN ('pg_catalog', 'information_schema')
    ORDER BY c.table_schema, c.table_name, c.ordinal_position
"#;

const REFERENCES_QUERY: &str = r#"
    SELECT
        t.relname AS referencing_table,
        n.nspname AS referencing_schema,
        a.attname AS referencing_column,
        rn.nspname AS referenced_schema,
        rt.relname AS referenced_table,
        ra.attname AS referenced_column
    FROM pg_catalog.pg_constraint con
    JOIN pg_catalog.pg_class t ON t.oid = con.conrelid
    JOIN pg_catalog.pg_namespace n ON n.oid = t.relnamespace
    JOIN pg_catalog.pg_class rt ON rt.oid = con.confrelid
    JOIN pg_catalog.pg_namespace rn ON rn.oid = rt.relnamespace
    JOIN pg_catalog.pg_attribute a ON a.attrelid = con.conrelid AND a.attnum = con.conkey[1]
    JOIN pg_catalog.pg_attribute ra ON ra.attrelid = con.confrelid AND ra.attnum = con.confkey[1]
    WHERE con.contype = 'f'
      AND cardinality(con.conkey) = 1
    ORDER BY n.nspname, t.relname, con.conname
"#;

/// PostgreSQL vendor profile. PostgreSQL has no engine-versioned column type,
/// so the auto-generated marker list is empty.
pub static PROFILE: VendorProfile = VendorProfile {
    name: "postgres",
    tables_query: TABLES_QUERY,
    columns_query: COLUMNS_QUERY,
    references_query: REFERENCES_QUERY,
    mapping: postgres_mapping(),
    auto_generated_types: &[],
    quote: quote_full_name,
};

/// Quote a (schema, table) pair with double quotes, doubling embedded quotes.
pub fn quote_full_name(schema: &str, table: &str) -> String {
    format!("\"{}\".\"{}\"", schema.replace('"', "\"\""), table.replace('"', "\"\""))
}

/// Catalog client over a borrowed tokio-postgres connection.
pub struct PgCatalog<'a> {
    client: &'a Client,
}

impl<'a> PgCatalog<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CatalogClient for PgCatalog<'_> {
    async fn fetch_tables(&mut self, sql: &str) -> Result<Vec<TableRow>> {
        let rows = self.client.query(sql, &[]).await?;
        Ok(rows
            .into_iter()
            .map(|row| TableRow {
                schema: row.get(0),
                name: row.get(1),
            })
            .collect())
    }

    async fn fetch_columns(&mut self, sql: &str) -> Result<Vec<ColumnRow>> {
        let rows = self.client.query(sql, &[]).await?;
        Ok(rows
            .into_iter()
            .map(|row| ColumnRow {
                table: row.get(0),
                schema: row.get(1),
                name: row.get(2),
                native_type: row.get(3),
                max_length: row.get(4),
                is_nullable: row.get(5),
                is_identity: row.get(6),
            })
            .collect())
    }

    async fn fetch_references(&mut self, sql: &str) -> Result<Vec<ReferenceRow>> {
        let rows = self.client.query(sql, &[]).await?;
        Ok(rows
            .into_iter()
            .map(|row| ReferenceRow {
                referencing_table: row.get(0),
                referencing_schema: row.get(1),
                referencing_column: row.get(2),
                referenced_schema: row.get(3),
                referenced_table: row.get(4),
                referenced_column: row.get(5),
            })
            .collect())
    }
}

/// Build a schema query provider over a borrowed PostgreSQL connection.
pub fn provider(client: &Client) -> SchemaQueryProvider<PgCatalog<'_>> {
    SchemaQueryProvider::new(PgCatalog::new(client), PROFILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_quote_quoting() {
        assert_eq!(quote_full_name("public", "orders"), "\"public\".\"orders\"");
        assert_eq!(quote_full_name("public", "we\"ird"), "\"public\".\"we\"\"ird\"");
    }

    #[test]
    fn test_profile_has_no_versioning_markers() {
        assert!(PROFILE.auto_generated_types.is_empty());
    }
}
