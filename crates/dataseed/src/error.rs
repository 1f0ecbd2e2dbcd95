//! Error types for schema introspection and helper generation.

use thiserror::Error;

/// Main error type for introspection and generation operations.
#[derive(Error, Debug)]
pub enum DataseedError {
    /// Configuration error (invalid YAML, missing fields, bad option combination)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Workbook authoring error (table regions, header cells, metadata comments)
    #[error("Workbook error in worksheet '{worksheet}': {detail}")]
    Metadata { worksheet: String, detail: String },

    /// SQL Server connection or catalog query error
    #[error("SQL Server error: {0}")]
    Source(#[from] tiberius::error::Error),

    /// PostgreSQL connection or catalog query error
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// Catalog reported a foreign key whose referencing column was never assembled
    #[error("Table {table} has no column '{column}' for a foreign key reference")]
    ColumnNotFound { table: String, column: String },

    /// A column was assigned a second foreign key
    #[error("Column {table}.{column} already has a foreign key")]
    ForeignKeyConflict { table: String, column: String },

    /// Operation not implemented by this provider
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Template renderer failure
    #[error("Template rendering failed: {0}")]
    Render(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl DataseedError {
    /// Create a Metadata error naming the offending worksheet.
    pub fn metadata(worksheet: impl Into<String>, detail: impl Into<String>) -> Self {
        DataseedError::Metadata {
            worksheet: worksheet.into(),
            detail: detail.into(),
        }
    }

    /// Create a Metadata error naming the worksheet and the column index.
    pub fn metadata_at(worksheet: impl Into<String>, cell_index: usize, detail: impl Into<String>) -> Self {
        let worksheet = worksheet.into();
        DataseedError::Metadata {
            detail: format!("cell at index {}: {}", cell_index, detail.into()),
            worksheet,
        }
    }
}

/// Result type alias for introspection and generation operations.
pub type Result<T> = std::result::Result<T, DataseedError>;
