//! Catalog client capability traits.
//!
//! These two traits are the whole I/O boundary of the reconciliation
//! engine. `ReadClient` alone is enough to compute a diff; writing needs a
//! full [`Client`].

use async_trait::async_trait;

use super::error::MetastoreResult;
use super::types::{Database, Partition, Table};

/// Read access to a catalog.
#[async_trait]
pub trait ReadClient: Send + Sync {
    /// Get a table. Missing tables are a `NotFound` error.
    async fn get_table(&self, db: &str, table: &str) -> MetastoreResult<Table>;

    /// Check whether a table exists.
    async fn has_table(&self, db: &str, table: &str) -> MetastoreResult<bool>;

    /// List all partitions of a table.
    async fn get_partitions(&self, db: &str, table: &str) -> MetastoreResult<Vec<Partition>>;

    /// Get one partition by its values. `None` when it does not exist.
    async fn get_partition(
        &self,
        db: &str,
        table: &str,
        values: &[String],
    ) -> MetastoreResult<Option<Partition>>;

    /// Get a database.
    async fn get_database(&self, name: &str) -> MetastoreResult<Database>;

    /// List databases matching a pattern. Pattern syntax is up to the catalog.
    async fn get_databases(&self, pattern: &str) -> MetastoreResult<Vec<Database>>;

    /// List tables of a database matching a pattern.
    async fn get_tables(&self, db: &str, pattern: &str) -> MetastoreResult<Vec<Table>>;
}

/// Write access to a catalog.
#[async_trait]
pub trait WriteClient: Send + Sync {
    /// Create a table. Fails if it already exists.
    async fn create_table(&self, table: &Table) -> MetastoreResult<()>;

    /// Replace the definition of `db.table`.
    async fn alter_table(&self, db: &str, table: &str, new_table: &Table) -> MetastoreResult<()>;

    /// Add partitions in one batch.
    async fn add_partitions(
        &self,
        table: &str,
        db: &str,
        partitions: &[Partition],
    ) -> MetastoreResult<()>;

    /// Alter partitions in one batch.
    async fn alter_partitions(
        &self,
        db: &str,
        table: &str,
        partitions: &[Partition],
    ) -> MetastoreResult<()>;

    /// Alter a single partition.
    async fn alter_partition(&self, db: &str, table: &str, partition: &Partition)
        -> MetastoreResult<()>;

    /// Add a single partition.
    async fn add_partition(&self, table: &str, db: &str, partition: &Partition)
        -> MetastoreResult<()>;

    /// Drop the partition with the given values.
    async fn drop_partition(&self, db: &str, table: &str, values: &[String]) -> MetastoreResult<()>;

    /// Create a database. Fails with `SchemaExists` if it is already there.
    async fn create_database(&self, database: &Database) -> MetastoreResult<()>;

    /// Normalize a database name for this catalog.
    fn normalize_db_name(&self, name: &str) -> String;

    /// Default location of a database in this catalog.
    fn get_db_location(&self, name: &str) -> String;
}

/// A catalog that can be both read and written.
pub trait Client: ReadClient + WriteClient {}

impl<T: ReadClient + WriteClient + ?Sized> Client for T {}
