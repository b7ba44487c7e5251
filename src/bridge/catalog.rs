//! `ReadClient`/`WriteClient` over a catalog bridge.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::IgnoredAny;

use super::client::BridgeClient;
use super::error::BridgeError;
use super::protocol::{self, methods};
use crate::config::CatalogSettings;
use crate::metastore::{
    Database, MetastoreError, MetastoreResult, Partition, ReadClient, Table, WriteClient,
};

/// A catalog reached through a bridge process.
///
/// # Example
///
/// ```ignore
/// use metasync::bridge::BridgeCatalog;
///
/// let settings = Settings::load()?;
/// let source = BridgeCatalog::connect(settings.get_catalog("source")?).await?;
/// let tables = source.get_tables("sales", "*").await?;
/// ```
pub struct BridgeCatalog {
    client: Arc<BridgeClient>,
    db_location_root: String,
    normalize_db_names: bool,
}

impl BridgeCatalog {
    /// Wrap a running bridge client.
    pub fn new(client: Arc<BridgeClient>, db_location_root: impl Into<String>) -> Self {
        Self {
            client,
            db_location_root: db_location_root.into(),
            normalize_db_names: false,
        }
    }

    /// Lowercase database names and replace `-` with `_` when normalizing.
    pub fn with_normalized_names(mut self, normalize: bool) -> Self {
        self.normalize_db_names = normalize;
        self
    }

    /// Spawn the bridge described by `settings` and wrap it.
    pub async fn connect(settings: &CatalogSettings) -> MetastoreResult<Self> {
        let config_error = |e: crate::config::SettingsError| MetastoreError::Client(e.to_string());
        let bridge = settings.resolved_bridge().map_err(config_error)?;
        let args = settings.resolved_args().map_err(config_error)?;
        let client = BridgeClient::spawn_with_timeout(
            &bridge,
            &args,
            Duration::from_secs(settings.timeout_secs),
        )
        .await?;
        Ok(Self::new(Arc::new(client), settings.db_location_root.clone())
            .with_normalized_names(settings.normalize_db_names))
    }

    async fn call<P, R>(&self, method: &str, params: P) -> MetastoreResult<R>
    where
        P: serde::Serialize + Send,
        R: serde::de::DeserializeOwned,
    {
        self.client
            .request(method, params)
            .await
            .map_err(lift_error::<R>)
    }
}

/// A well-formed response whose payload is not the entity we asked for.
fn lift_error<R>(err: BridgeError) -> MetastoreError {
    match err {
        BridgeError::DeserializeFailed(e) => MetastoreError::UnexpectedType {
            expected: std::any::type_name::<R>(),
            got: e.to_string(),
        },
        other => other.into(),
    }
}

#[async_trait]
impl ReadClient for BridgeCatalog {
    async fn get_table(&self, db: &str, table: &str) -> MetastoreResult<Table> {
        let response: protocol::GetTableResponse = self
            .call(methods::GET_TABLE, protocol::TableParams { db, table })
            .await?;
        Ok(response.table)
    }

    async fn has_table(&self, db: &str, table: &str) -> MetastoreResult<bool> {
        let response: protocol::HasTableResponse = self
            .call(methods::HAS_TABLE, protocol::TableParams { db, table })
            .await?;
        Ok(response.exists)
    }

    async fn get_partitions(&self, db: &str, table: &str) -> MetastoreResult<Vec<Partition>> {
        let response: protocol::GetPartitionsResponse = self
            .call(methods::GET_PARTITIONS, protocol::TableParams { db, table })
            .await?;
        Ok(response.partitions)
    }

    async fn get_partition(
        &self,
        db: &str,
        table: &str,
        values: &[String],
    ) -> MetastoreResult<Option<Partition>> {
        let result: MetastoreResult<protocol::GetPartitionResponse> = self
            .call(
                methods::GET_PARTITION,
                protocol::PartitionParams { db, table, values },
            )
            .await;
        match result {
            Ok(response) => Ok(response.partition),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn get_database(&self, name: &str) -> MetastoreResult<Database> {
        let response: protocol::GetDatabaseResponse = self
            .call(methods::GET_DATABASE, protocol::GetDatabaseParams { name })
            .await?;
        Ok(response.database)
    }

    async fn get_databases(&self, pattern: &str) -> MetastoreResult<Vec<Database>> {
        let response: protocol::GetDatabasesResponse = self
            .call(methods::GET_DATABASES, protocol::GetDatabasesParams { pattern })
            .await?;
        Ok(response.databases)
    }

    async fn get_tables(&self, db: &str, pattern: &str) -> MetastoreResult<Vec<Table>> {
        let response: protocol::GetTablesResponse = self
            .call(methods::GET_TABLES, protocol::GetTablesParams { db, pattern })
            .await?;
        Ok(response.tables)
    }
}

#[async_trait]
impl WriteClient for BridgeCatalog {
    async fn create_table(&self, table: &Table) -> MetastoreResult<()> {
        let _: IgnoredAny = self
            .call(methods::CREATE_TABLE, protocol::CreateTableParams { table })
            .await?;
        Ok(())
    }

    async fn alter_table(&self, db: &str, table: &str, new_table: &Table) -> MetastoreResult<()> {
        let _: IgnoredAny = self
            .call(
                methods::ALTER_TABLE,
                protocol::AlterTableParams {
                    db,
                    table,
                    new_table,
                },
            )
            .await?;
        Ok(())
    }

    async fn add_partitions(
        &self,
        table: &str,
        db: &str,
        partitions: &[Partition],
    ) -> MetastoreResult<()> {
        let _: IgnoredAny = self
            .call(
                methods::ADD_PARTITIONS,
                protocol::PartitionsParams {
                    db,
                    table,
                    partitions,
                },
            )
            .await?;
        Ok(())
    }

    async fn alter_partitions(
        &self,
        db: &str,
        table: &str,
        partitions: &[Partition],
    ) -> MetastoreResult<()> {
        let _: IgnoredAny = self
            .call(
                methods::ALTER_PARTITIONS,
                protocol::PartitionsParams {
                    db,
                    table,
                    partitions,
                },
            )
            .await?;
        Ok(())
    }

    async fn alter_partition(
        &self,
        db: &str,
        table: &str,
        partition: &Partition,
    ) -> MetastoreResult<()> {
        let _: IgnoredAny = self
            .call(
                methods::ALTER_PARTITION,
                protocol::PartitionWriteParams {
                    db,
                    table,
                    partition,
                },
            )
            .await?;
        Ok(())
    }

    async fn add_partition(
        &self,
        table: &str,
        db: &str,
        partition: &Partition,
    ) -> MetastoreResult<()> {
        let _: IgnoredAny = self
            .call(
                methods::ADD_PARTITION,
                protocol::PartitionWriteParams {
                    db,
                    table,
                    partition,
                },
            )
            .await?;
        Ok(())
    }

    async fn drop_partition(
        &self,
        db: &str,
        table: &str,
        values: &[String],
    ) -> MetastoreResult<()> {
        let _: IgnoredAny = self
            .call(
                methods::DROP_PARTITION,
                protocol::PartitionParams { db, table, values },
            )
            .await?;
        Ok(())
    }

    async fn create_database(&self, database: &Database) -> MetastoreResult<()> {
        let _: IgnoredAny = self
            .call(
                methods::CREATE_DATABASE,
                protocol::CreateDatabaseParams { database },
            )
            .await?;
        Ok(())
    }

    fn normalize_db_name(&self, name: &str) -> String {
        normalize_db_name(name, self.normalize_db_names)
    }

    fn get_db_location(&self, name: &str) -> String {
        db_location(&self.db_location_root, name)
    }
}

fn normalize_db_name(name: &str, normalize: bool) -> String {
    if normalize {
        name.to_lowercase().replace('-', "_")
    } else {
        name.to_string()
    }
}

fn db_location(root: &str, name: &str) -> String {
    if root.is_empty() {
        return String::new();
    }
    format!("{}/{}.db", root.trim_end_matches('/'), name)
}
