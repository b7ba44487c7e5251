//! Reconciliation of databases, tables and partitions between catalogs.
//!
//! # Table-level decision
//!
//! ```text
//!            explicit partition?
//!              │yes          │no
//!              ▼             ▼
//!       copy_partition   target has table?
//!                          │no        │yes
//!                          ▼          ▼
//!                        copy       merge
//! ```
//!
//! # Merge write order
//!
//! `merge` always issues `alter_table`, then `add_partitions`, then
//! `alter_partitions`, then one `drop_partition` per removed partition.
//! Batch calls are issued even when their bucket is empty.
//!
//! Nothing here is atomic: an error part way through leaves the target
//! partially updated, and the next run reconciles the rest.

use serde::Serialize;
use tracing::{debug, info, warn};

use super::client::{Client, ReadClient, WriteClient};
use super::diff::{
    diff, diff_iterable, ColumnCollection, DifferenceType, MetaDiff, PartitionCollection,
};
use super::error::{MetastoreError, MetastoreResult};
use super::location::LocationTransform;
use super::types::{Database, Partition, Table};

/// Where a table is copied to and how it is reshaped on the way.
#[derive(Debug, Clone, Copy)]
pub struct Destination<'a> {
    /// Target database.
    pub db: &'a str,
    /// Target table.
    pub table: &'a str,
    /// SerDe name to set; empty keeps the source's.
    pub serde: &'a str,
    /// Rename Spark SQL placeholder locations instead of transforming them.
    pub fix_spark_placeholder: bool,
}

/// A single table sync request.
#[derive(Debug, Clone, Default)]
pub struct TableSync {
    pub from_db: String,
    pub from_table: String,
    pub to_db: String,
    pub to_table: String,
    /// SerDe name to set on the target; empty keeps the source's.
    pub serde: String,
    /// Values of one partition to sync instead of the whole table.
    pub partition: Vec<String>,
    pub fix_spark_placeholder: bool,
}

impl TableSync {
    /// Sync `from_db.from_table` into `to_db.to_table`.
    pub fn new(
        from_db: impl Into<String>,
        from_table: impl Into<String>,
        to_db: impl Into<String>,
        to_table: impl Into<String>,
    ) -> Self {
        Self {
            from_db: from_db.into(),
            from_table: from_table.into(),
            to_db: to_db.into(),
            to_table: to_table.into(),
            ..Default::default()
        }
    }

    /// Set the SerDe name written to the target.
    pub fn with_serde(mut self, serde: impl Into<String>) -> Self {
        self.serde = serde.into();
        self
    }

    /// Restrict the sync to one partition.
    pub fn with_partition<V: Into<String>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
        self.partition = values.into_iter().map(Into::into).collect();
        self
    }

    /// Enable the Spark SQL placeholder fix-up.
    pub fn with_fix_spark_placeholder(mut self, fix: bool) -> Self {
        self.fix_spark_placeholder = fix;
        self
    }

    /// The target side of this request.
    pub fn destination(&self) -> Destination<'_> {
        Destination {
            db: &self.to_db,
            table: &self.to_table,
            serde: &self.serde,
            fix_spark_placeholder: self.fix_spark_placeholder,
        }
    }
}

/// Options for whole-catalog syncs.
#[derive(Debug, Clone, Default)]
pub struct BatchSync {
    /// Database name pattern, passed to the source catalog.
    pub schema_filter: String,
    /// Table name pattern, passed to the source catalog.
    pub table_filter: String,
    /// Report table failures and carry on instead of aborting.
    pub continue_on_error: bool,
    pub fix_spark_placeholder: bool,
}

/// A table that failed during a batch sync run with `continue_on_error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableFailure {
    /// `db.table` in the source catalog.
    pub table: String,
    pub error: String,
}

/// Outcome of a batch sync that did not abort.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Databases newly created on the target.
    pub databases_created: Vec<String>,
    /// `db.table` names on the target that were copied or merged.
    pub tables_synced: Vec<String>,
    /// Tables skipped because of errors.
    pub tables_failed: Vec<TableFailure>,
}

/// Copy a database definition, renaming it and rewriting its location.
pub async fn copy_db<R, W>(
    from: &R,
    to: &W,
    from_db: &str,
    to_db: &str,
    transform: &LocationTransform,
) -> MetastoreResult<()>
where
    R: ReadClient + ?Sized,
    W: WriteClient + ?Sized,
{
    let mut database: Database = from.get_database(from_db).await?;
    database.name = to_db.to_string();
    database.location_uri = transform.apply(&database.location_uri)?;
    to.create_database(&database).await
}

/// Copy a table (or one of its partitions) into the target, merging with
/// whatever is already there.
pub async fn copy_or_merge<R, C>(
    from: &R,
    to: &C,
    request: &TableSync,
    transform: &LocationTransform,
) -> MetastoreResult<()>
where
    R: ReadClient + ?Sized,
    C: Client + ?Sized,
{
    if !request.partition.is_empty() {
        log_path("CopyPartition", request);
        return copy_partition(from, to, request, transform).await;
    }

    let has_table = to.has_table(&request.to_db, &request.to_table).await?;
    log_path(if has_table { "Merge" } else { "Copy" }, request);

    let table = from.get_table(&request.from_db, &request.from_table).await?;
    let partitions = from
        .get_partitions(&request.from_db, &request.from_table)
        .await?;
    if has_table {
        merge(to, table, PartitionCollection::new(partitions), request.destination(), transform)
            .await
    } else {
        copy(to, table, partitions, request.destination(), transform).await
    }
}

/// Like [`copy_or_merge`] for a source table that has already been read.
pub async fn copy_or_merge_from_values<R, C>(
    from: &R,
    table: Table,
    to: &C,
    request: &TableSync,
    transform: &LocationTransform,
) -> MetastoreResult<()>
where
    R: ReadClient + ?Sized,
    C: Client + ?Sized,
{
    let has_table = to.has_table(&request.to_db, &request.to_table).await?;
    let partitions = from
        .get_partitions(&request.from_db, &request.from_table)
        .await?;
    if has_table {
        merge(to, table, PartitionCollection::new(partitions), request.destination(), transform)
            .await
    } else {
        copy(to, table, partitions, request.destination(), transform).await
    }
}

/// Create a table that does not exist on the target yet, with all its
/// partitions in one batch.
pub async fn copy<W>(
    to: &W,
    mut table: Table,
    mut partitions: Vec<Partition>,
    dest: Destination<'_>,
    transform: &LocationTransform,
) -> MetastoreResult<()>
where
    W: WriteClient + ?Sized,
{
    let is_spark_sql_table = table.is_spark_sql_table();
    table.update(
        dest.db,
        dest.table,
        dest.serde,
        transform,
        is_spark_sql_table,
        dest.fix_spark_placeholder,
    )?;
    for partition in &mut partitions {
        partition.update(
            dest.db,
            dest.table,
            dest.serde,
            transform,
            is_spark_sql_table,
            dest.fix_spark_placeholder,
        )?;
    }

    to.create_table(&table).await?;
    to.add_partitions(dest.table, dest.db, &partitions).await?;
    info!(
        table = %table.qualified_name(),
        partitions = partitions.len(),
        "copied table"
    );
    Ok(())
}

/// Reconcile an existing target table with the source table and partitions.
///
/// Partitions only on the target are dropped, partitions only in the source
/// are added, and partitions on both sides are altered to the source's
/// definition. See the module docs for the write order.
pub async fn merge<C>(
    to: &C,
    mut table: Table,
    source_partitions: PartitionCollection,
    dest: Destination<'_>,
    transform: &LocationTransform,
) -> MetastoreResult<()>
where
    C: Client + ?Sized,
{
    let is_spark_sql_table = table.is_spark_sql_table();
    table.update(
        dest.db,
        dest.table,
        dest.serde,
        transform,
        is_spark_sql_table,
        dest.fix_spark_placeholder,
    )?;

    let target_partitions = PartitionCollection::new(to.get_partitions(dest.db, dest.table).await?);

    let mut add_partitions = Vec::new();
    let mut alter_partitions = Vec::new();
    let mut remove_partitions: Vec<Vec<String>> = Vec::new();
    diff_iterable(
        &target_partitions,
        &source_partitions,
        |kind, partition, _| -> MetastoreResult<()> {
            if kind == DifferenceType::Removed {
                // Already target-shaped; only the values are needed to drop it.
                remove_partitions.push(partition.values.clone());
                return Ok(());
            }
            let mut partition = partition.clone();
            partition.update(
                dest.db,
                dest.table,
                dest.serde,
                transform,
                is_spark_sql_table,
                dest.fix_spark_placeholder,
            )?;
            if kind == DifferenceType::Added {
                add_partitions.push(partition);
            } else {
                alter_partitions.push(partition);
            }
            Ok(())
        },
    )?;

    to.alter_table(dest.db, dest.table, &table).await?;
    to.add_partitions(dest.table, dest.db, &add_partitions).await?;
    to.alter_partitions(dest.db, dest.table, &alter_partitions).await?;
    for values in &remove_partitions {
        to.drop_partition(dest.db, dest.table, values).await?;
    }

    info!(
        table = %table.qualified_name(),
        added = add_partitions.len(),
        altered = alter_partitions.len(),
        dropped = remove_partitions.len(),
        "merged table"
    );
    Ok(())
}

/// Sync a single partition, known by its values, without listing the
/// table's partitions.
pub async fn copy_partition<R, C>(
    from: &R,
    to: &C,
    request: &TableSync,
    transform: &LocationTransform,
) -> MetastoreResult<()>
where
    R: ReadClient + ?Sized,
    C: Client + ?Sized,
{
    let table = from.get_table(&request.from_db, &request.from_table).await?;
    let mut partition = from
        .get_partition(&request.from_db, &request.from_table, &request.partition)
        .await?
        .ok_or_else(|| {
            MetastoreError::not_found(format!(
                "{}.{}/{}",
                request.from_db,
                request.from_table,
                request.partition.join("/")
            ))
        })?;
    let existing = to
        .get_partition(&request.to_db, &request.to_table, &request.partition)
        .await?;

    partition.update(
        &request.to_db,
        &request.to_table,
        &request.serde,
        transform,
        table.is_spark_sql_table(),
        request.fix_spark_placeholder,
    )?;

    match existing {
        None => {
            to.add_partition(&request.to_table, &request.to_db, &partition)
                .await
        }
        Some(_) => {
            to.alter_partition(&request.to_db, &request.to_table, &partition)
                .await
        }
    }
}

/// Copy or merge every matching table of every matching database,
/// substituting `to_branch` into locations.
pub async fn copy_or_merge_all<R, C>(
    from: &R,
    to: &C,
    batch: &BatchSync,
    dbfs_location: &str,
    to_branch: &str,
) -> MetastoreResult<SyncReport>
where
    R: ReadClient + ?Sized,
    C: Client + ?Sized,
{
    let databases = from.get_databases(&batch.schema_filter).await?;
    let transform = LocationTransform::branch(dbfs_location, to_branch);
    apply_all(from, to, databases, batch, &transform).await
}

/// Like [`copy_or_merge_all`], but addresses external locations as data
/// imported into `repository` at `to_branch`.
pub async fn import_all<R, C>(
    from: &R,
    to: &C,
    batch: &BatchSync,
    repository: &str,
    to_branch: &str,
    dbfs_location: &str,
) -> MetastoreResult<SyncReport>
where
    R: ReadClient + ?Sized,
    C: Client + ?Sized,
{
    let databases = from.get_databases(&batch.schema_filter).await?;
    let transform = LocationTransform::import(dbfs_location, repository, to_branch);
    apply_all(from, to, databases, batch, &transform).await
}

async fn apply_all<R, C>(
    from: &R,
    to: &C,
    databases: Vec<Database>,
    batch: &BatchSync,
    transform: &LocationTransform,
) -> MetastoreResult<SyncReport>
where
    R: ReadClient + ?Sized,
    C: Client + ?Sized,
{
    let mut report = SyncReport::default();

    for database in databases {
        let from_db = database.name;
        let to_db = to.normalize_db_name(&from_db);

        match copy_db(from, to, &from_db, &to_db, transform).await {
            Ok(()) => report.databases_created.push(to_db.clone()),
            Err(e) if e.is_schema_exists() => debug!(database = %to_db, "database exists"),
            Err(e) => return Err(e),
        }

        let tables = from.get_tables(&from_db, &batch.table_filter).await?;
        for table in tables {
            let table_name = table.table_name.clone();
            info!("table {from_db}.{table_name} -> {to_db}.{table_name}");

            let request = TableSync::new(&from_db, &table_name, &to_db, &table_name)
                .with_serde(&table_name)
                .with_fix_spark_placeholder(batch.fix_spark_placeholder);
            match copy_or_merge_from_values(from, table, to, &request, transform).await {
                Ok(()) => report.tables_synced.push(format!("{to_db}.{table_name}")),
                Err(e) if batch.continue_on_error => {
                    warn!(table = %format!("{from_db}.{table_name}"), error = %e, "skipping table");
                    report.tables_failed.push(TableFailure {
                        table: format!("{from_db}.{table_name}"),
                        error: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }

    Ok(report)
}

/// Copy a table within one catalog, pointing the copy at a symlink tree
/// under `location_prefix`.
///
/// The request's SerDe and partition are ignored.
pub async fn copy_or_merge_to_symlink<C>(
    client: &C,
    request: &TableSync,
    location_prefix: &str,
) -> MetastoreResult<()>
where
    C: Client + ?Sized,
{
    let request = TableSync {
        serde: String::new(),
        partition: Vec::new(),
        ..request.clone()
    };
    let transform = LocationTransform::symlink(location_prefix);
    copy_or_merge(client, client, &request, &transform).await
}

/// Compute column and partition differences between two tables without
/// writing anything.
///
/// The target is the left (current) side, so `Added` marks what a sync
/// would add.
pub async fn get_diff<R, S>(
    from: &R,
    to: &S,
    from_db: &str,
    from_table: &str,
    to_db: &str,
    to_table: &str,
) -> MetastoreResult<MetaDiff>
where
    R: ReadClient + ?Sized,
    S: ReadClient + ?Sized,
{
    let source = from.get_table(from_db, from_table).await?;
    let target = to.get_table(to_db, to_table).await?;
    let columns_diff = diff(
        &ColumnCollection::new(target.sd.cols),
        &ColumnCollection::new(source.sd.cols),
    );

    let source_partitions = from.get_partitions(from_db, from_table).await?;
    let target_partitions = to.get_partitions(to_db, to_table).await?;
    let partition_diff = diff(
        &PartitionCollection::new(target_partitions),
        &PartitionCollection::new(source_partitions),
    );

    Ok(MetaDiff {
        columns_diff,
        partition_diff,
    })
}

fn log_path(path: &str, request: &TableSync) {
    debug!(
        from_db = %request.from_db,
        from_table = %request.from_table,
        to_db = %request.to_db,
        to_table = %request.to_table,
        serde = %request.serde,
        partition_len = request.partition.len(),
        "{path}"
    );
}
