//! In-memory catalog.
//!
//! `MemoryCatalog` implements both client traits over plain maps and keeps
//! a log of every write it receives, in order. It backs the test suite and
//! is handy for dry runs against a snapshot of a real catalog.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use regex::RegexBuilder;
use tokio::sync::Mutex;

use super::client::{ReadClient, WriteClient};
use super::error::{MetastoreError, MetastoreResult};
use super::types::{Database, Partition, Table};

/// A write received by a [`MemoryCatalog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogCall {
    CreateDatabase { name: String },
    CreateTable { db: String, table: String },
    AlterTable { db: String, table: String },
    AddPartitions { db: String, table: String, values: Vec<Vec<String>> },
    AlterPartitions { db: String, table: String, values: Vec<Vec<String>> },
    AddPartition { db: String, table: String, values: Vec<String> },
    AlterPartition { db: String, table: String, values: Vec<String> },
    DropPartition { db: String, table: String, values: Vec<String> },
}

impl CatalogCall {
    /// Method name, e.g. `add_partitions`.
    pub fn method(&self) -> &'static str {
        match self {
            Self::CreateDatabase { .. } => "create_database",
            Self::CreateTable { .. } => "create_table",
            Self::AlterTable { .. } => "alter_table",
            Self::AddPartitions { .. } => "add_partitions",
            Self::AlterPartitions { .. } => "alter_partitions",
            Self::AddPartition { .. } => "add_partition",
            Self::AlterPartition { .. } => "alter_partition",
            Self::DropPartition { .. } => "drop_partition",
        }
    }
}

type TableKey = (String, String);

#[derive(Debug, Default)]
struct State {
    databases: BTreeMap<String, Database>,
    tables: BTreeMap<TableKey, Table>,
    partitions: BTreeMap<TableKey, BTreeMap<Vec<String>, Partition>>,
    calls: Vec<CatalogCall>,
    /// Qualified names (`db` or `db.table`) whose writes fail.
    failing: BTreeSet<String>,
}

impl State {
    fn check_failing(&self, name: &str) -> MetastoreResult<()> {
        if self.failing.contains(name) {
            return Err(MetastoreError::Client(format!("injected failure for {name}")));
        }
        Ok(())
    }

    fn partitions_mut(
        &mut self,
        db: &str,
        table: &str,
    ) -> MetastoreResult<&mut BTreeMap<Vec<String>, Partition>> {
        let key = (db.to_string(), table.to_string());
        if !self.tables.contains_key(&key) {
            return Err(MetastoreError::not_found(format!("{db}.{table}")));
        }
        Ok(self.partitions.entry(key).or_default())
    }
}

/// Catalog held entirely in memory.
#[derive(Debug)]
pub struct MemoryCatalog {
    state: Mutex<State>,
    warehouse: String,
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::with_warehouse("memory://warehouse")
    }

    /// Create an empty catalog whose default database locations live under
    /// `warehouse`.
    pub fn with_warehouse(warehouse: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(State::default()),
            warehouse: warehouse.into(),
        }
    }

    /// Add a database.
    pub fn with_database(mut self, database: Database) -> Self {
        self.state
            .get_mut()
            .databases
            .insert(database.name.clone(), database);
        self
    }

    /// Add a table and its partitions.
    pub fn with_table(mut self, table: Table, partitions: Vec<Partition>) -> Self {
        let key = (table.db_name.clone(), table.table_name.clone());
        let state = self.state.get_mut();
        state.tables.insert(key.clone(), table);
        state.partitions.insert(
            key,
            partitions.into_iter().map(|p| (p.values.clone(), p)).collect(),
        );
        self
    }

    /// Make every write to `db.table` (or, for a bare `db`, database
    /// creation) fail with a client error.
    pub fn with_failure(mut self, qualified_name: impl Into<String>) -> Self {
        self.state.get_mut().failing.insert(qualified_name.into());
        self
    }

    /// Writes received so far, in order.
    pub async fn calls(&self) -> Vec<CatalogCall> {
        self.state.lock().await.calls.clone()
    }

    /// Method names of the writes received so far.
    pub async fn call_methods(&self) -> Vec<&'static str> {
        self.state.lock().await.calls.iter().map(CatalogCall::method).collect()
    }

    /// Snapshot of a table, if present.
    pub async fn table(&self, db: &str, table: &str) -> Option<Table> {
        let state = self.state.lock().await;
        state.tables.get(&(db.to_string(), table.to_string())).cloned()
    }

    /// Snapshot of a table's partitions in value order.
    pub async fn partitions(&self, db: &str, table: &str) -> Vec<Partition> {
        let state = self.state.lock().await;
        state
            .partitions
            .get(&(db.to_string(), table.to_string()))
            .map(|parts| parts.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Snapshot of a database, if present.
    pub async fn database(&self, name: &str) -> Option<Database> {
        self.state.lock().await.databases.get(name).cloned()
    }
}

/// Match a name against a Hive-style pattern: `*` wildcards and `|`
/// separated alternatives, case-insensitive. Empty matches everything.
pub fn matches_pattern(pattern: &str, name: &str) -> bool {
    if pattern.is_empty() {
        return true;
    }
    pattern.split('|').any(|alternative| {
        let expr = format!("^{}$", regex::escape(alternative.trim()).replace(r"\*", ".*"));
        RegexBuilder::new(&expr)
            .case_insensitive(true)
            .build()
            .map(|re| re.is_match(name))
            .unwrap_or(false)
    })
}

fn values_of(partitions: &[Partition]) -> Vec<Vec<String>> {
    partitions.iter().map(|p| p.values.clone()).collect()
}

#[async_trait]
impl ReadClient for MemoryCatalog {
    async fn get_table(&self, db: &str, table: &str) -> MetastoreResult<Table> {
        self.table(db, table)
            .await
            .ok_or_else(|| MetastoreError::not_found(format!("{db}.{table}")))
    }

    async fn has_table(&self, db: &str, table: &str) -> MetastoreResult<bool> {
        Ok(self.table(db, table).await.is_some())
    }

    async fn get_partitions(&self, db: &str, table: &str) -> MetastoreResult<Vec<Partition>> {
        if self.table(db, table).await.is_none() {
            return Err(MetastoreError::not_found(format!("{db}.{table}")));
        }
        Ok(self.partitions(db, table).await)
    }

    async fn get_partition(
        &self,
        db: &str,
        table: &str,
        values: &[String],
    ) -> MetastoreResult<Option<Partition>> {
        let state = self.state.lock().await;
        Ok(state
            .partitions
            .get(&(db.to_string(), table.to_string()))
            .and_then(|parts| parts.get(values))
            .cloned())
    }

    async fn get_database(&self, name: &str) -> MetastoreResult<Database> {
        self.database(name)
            .await
            .ok_or_else(|| MetastoreError::not_found(name))
    }

    async fn get_databases(&self, pattern: &str) -> MetastoreResult<Vec<Database>> {
        let state = self.state.lock().await;
        Ok(state
            .databases
            .values()
            .filter(|db| matches_pattern(pattern, &db.name))
            .cloned()
            .collect())
    }

    async fn get_tables(&self, db: &str, pattern: &str) -> MetastoreResult<Vec<Table>> {
        let state = self.state.lock().await;
        if !state.databases.contains_key(db) {
            return Err(MetastoreError::not_found(db));
        }
        Ok(state
            .tables
            .iter()
            .filter(|((d, t), _)| d == db && matches_pattern(pattern, t))
            .map(|(_, table)| table.clone())
            .collect())
    }
}

#[async_trait]
impl WriteClient for MemoryCatalog {
    async fn create_table(&self, table: &Table) -> MetastoreResult<()> {
        let mut state = self.state.lock().await;
        state.calls.push(CatalogCall::CreateTable {
            db: table.db_name.clone(),
            table: table.table_name.clone(),
        });
        state.check_failing(&table.qualified_name())?;

        let key = (table.db_name.clone(), table.table_name.clone());
        if state.tables.contains_key(&key) {
            return Err(MetastoreError::Client(format!(
                "table already exists: {}",
                table.qualified_name()
            )));
        }
        state.tables.insert(key.clone(), table.clone());
        state.partitions.insert(key, BTreeMap::new());
        Ok(())
    }

    async fn alter_table(&self, db: &str, table: &str, new_table: &Table) -> MetastoreResult<()> {
        let mut state = self.state.lock().await;
        state.calls.push(CatalogCall::AlterTable {
            db: db.to_string(),
            table: table.to_string(),
        });
        state.check_failing(&format!("{db}.{table}"))?;

        let key = (db.to_string(), table.to_string());
        if state.tables.remove(&key).is_none() {
            return Err(MetastoreError::not_found(format!("{db}.{table}")));
        }
        let new_key = (new_table.db_name.clone(), new_table.table_name.clone());
        if new_key != key {
            if let Some(parts) = state.partitions.remove(&key) {
                state.partitions.insert(new_key.clone(), parts);
            }
        }
        state.tables.insert(new_key, new_table.clone());
        Ok(())
    }

    async fn add_partitions(
        &self,
        table: &str,
        db: &str,
        partitions: &[Partition],
    ) -> MetastoreResult<()> {
        let mut state = self.state.lock().await;
        state.calls.push(CatalogCall::AddPartitions {
            db: db.to_string(),
            table: table.to_string(),
            values: values_of(partitions),
        });
        state.check_failing(&format!("{db}.{table}"))?;

        let parts = state.partitions_mut(db, table)?;
        if let Some(existing) = partitions.iter().find(|p| parts.contains_key(&p.values)) {
            return Err(MetastoreError::Client(format!(
                "partition already exists: {db}.{table}/{}",
                existing.key()
            )));
        }
        for partition in partitions {
            parts.insert(partition.values.clone(), partition.clone());
        }
        Ok(())
    }

    async fn alter_partitions(
        &self,
        db: &str,
        table: &str,
        partitions: &[Partition],
    ) -> MetastoreResult<()> {
        let mut state = self.state.lock().await;
        state.calls.push(CatalogCall::AlterPartitions {
            db: db.to_string(),
            table: table.to_string(),
            values: values_of(partitions),
        });
        state.check_failing(&format!("{db}.{table}"))?;

        let parts = state.partitions_mut(db, table)?;
        if let Some(missing) = partitions.iter().find(|p| !parts.contains_key(&p.values)) {
            return Err(MetastoreError::not_found(format!(
                "{db}.{table}/{}",
                missing.key()
            )));
        }
        for partition in partitions {
            parts.insert(partition.values.clone(), partition.clone());
        }
        Ok(())
    }

    async fn alter_partition(
        &self,
        db: &str,
        table: &str,
        partition: &Partition,
    ) -> MetastoreResult<()> {
        let mut state = self.state.lock().await;
        state.calls.push(CatalogCall::AlterPartition {
            db: db.to_string(),
            table: table.to_string(),
            values: partition.values.clone(),
        });
        state.check_failing(&format!("{db}.{table}"))?;

        let parts = state.partitions_mut(db, table)?;
        match parts.get_mut(&partition.values) {
            Some(existing) => {
                *existing = partition.clone();
                Ok(())
            }
            None => Err(MetastoreError::not_found(format!(
                "{db}.{table}/{}",
                partition.key()
            ))),
        }
    }

    async fn add_partition(
        &self,
        table: &str,
        db: &str,
        partition: &Partition,
    ) -> MetastoreResult<()> {
        let mut state = self.state.lock().await;
        state.calls.push(CatalogCall::AddPartition {
            db: db.to_string(),
            table: table.to_string(),
            values: partition.values.clone(),
        });
        state.check_failing(&format!("{db}.{table}"))?;

        let parts = state.partitions_mut(db, table)?;
        if parts.contains_key(&partition.values) {
            return Err(MetastoreError::Client(format!(
                "partition already exists: {db}.{table}/{}",
                partition.key()
            )));
        }
        parts.insert(partition.values.clone(), partition.clone());
        Ok(())
    }

    async fn drop_partition(
        &self,
        db: &str,
        table: &str,
        values: &[String],
    ) -> MetastoreResult<()> {
        let mut state = self.state.lock().await;
        state.calls.push(CatalogCall::DropPartition {
            db: db.to_string(),
            table: table.to_string(),
            values: values.to_vec(),
        });
        state.check_failing(&format!("{db}.{table}"))?;

        let parts = state.partitions_mut(db, table)?;
        parts
            .remove(values)
            .map(|_| ())
            .ok_or_else(|| MetastoreError::not_found(format!("{db}.{table}/{}", values.join("/"))))
    }

    async fn create_database(&self, database: &Database) -> MetastoreResult<()> {
        let mut state = self.state.lock().await;
        state.calls.push(CatalogCall::CreateDatabase {
            name: database.name.clone(),
        });
        state.check_failing(&database.name)?;

        if state.databases.contains_key(&database.name) {
            return Err(MetastoreError::SchemaExists(database.name.clone()));
        }
        state
            .databases
            .insert(database.name.clone(), database.clone());
        Ok(())
    }

    fn normalize_db_name(&self, name: &str) -> String {
        name.to_string()
    }

    fn get_db_location(&self, name: &str) -> String {
        format!("{}/{}.db", self.warehouse.trim_end_matches('/'), name)
    }
}
