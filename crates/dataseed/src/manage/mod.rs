//! Database management providers for running DDL and seed scripts.
//!
//! A provider that does not implement an operation fails explicitly instead
//! of silently doing nothing.

use async_trait::async_trait;
use tracing::debug;

use crate::error::{DataseedError, Result};
use crate::provider::mssql::MssqlConnection;

/// Schema-modifying operations against a borrowed connection.
#[async_trait]
pub trait DbManagementProvider: Send {
    /// Execute a sequence of SQL script batches in order.
    async fn execute_scripts(&mut self, scripts: &[String]) -> Result<()>;
}

/// SQL Server management provider.
pub struct MssqlManagementProvider<'a> {
    client: &'a mut MssqlConnection,
}

impl<'a> MssqlManagementProvider<'a> {
    pub fn new(client: &'a mut MssqlConnection) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DbManagementProvider for MssqlManagementProvider<'_> {
    async fn execute_scripts(&mut self, scripts: &[String]) -> Result<()> {
        for (idx, script) in scripts.iter().enumerate() {
            debug!("Executing script batch {} of {}", idx + 1, scripts.len());
            self.client.simple_query(script).await?.into_results().await?;
        }
        Ok(())
    }
}

/// PostgreSQL management provider. Script execution is not implemented for
/// this vendor.
pub struct PostgresManagementProvider<'a> {
    #[allow(dead_code)]
    client: &'a tokio_postgres::Client,
}

impl<'a> PostgresManagementProvider<'a> {
    pub fn new(client: &'a tokio_postgres::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DbManagementProvider for PostgresManagementProvider<'_> {
    async fn execute_scripts(&mut self, _scripts: &[String]) -> Result<()> {
        Err(DataseedError::Unsupported(
            "script execution is not implemented for the postgres provider".to_string(),
        ))
    }
}
