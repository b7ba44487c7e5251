//! In-place retargeting of tables and partitions.
//!
//! Before an entity is written to the target catalog it is renamed to the
//! target database/table, optionally given a new SerDe name, and has its
//! locations rewritten.

use super::error::MetastoreResult;
use super::location::LocationTransform;
use super::types::{
    Partition, StorageDescriptor, Table, SPARK_SQL_PATH_KEY, SPARK_SQL_PLACEHOLDER_SUFFIX,
};

impl Table {
    /// Retarget this table at `to_db.to_table`.
    ///
    /// `serde` replaces the SerDe name unless empty. When the table is a
    /// Spark SQL datasource table and `fix_spark_placeholder` is set, the
    /// transformed placeholder location is also renamed to the target.
    pub fn update(
        &mut self,
        to_db: &str,
        to_table: &str,
        serde: &str,
        transform: &LocationTransform,
        is_spark_sql_table: bool,
        fix_spark_placeholder: bool,
    ) -> MetastoreResult<()> {
        let target = Retarget {
            from_db: &self.db_name,
            from_table: &self.table_name,
            to_db,
            to_table,
            serde,
            fix_placeholder: is_spark_sql_table && fix_spark_placeholder,
        };
        target.apply(&mut self.sd, transform)?;
        self.db_name = to_db.to_string();
        self.table_name = to_table.to_string();
        Ok(())
    }
}

impl Partition {
    /// Retarget this partition at `to_db.to_table`.
    ///
    /// Same rules as [`Table::update`]; `is_spark_sql_table` comes from the
    /// owning table.
    pub fn update(
        &mut self,
        to_db: &str,
        to_table: &str,
        serde: &str,
        transform: &LocationTransform,
        is_spark_sql_table: bool,
        fix_spark_placeholder: bool,
    ) -> MetastoreResult<()> {
        let target = Retarget {
            from_db: &self.db_name,
            from_table: &self.table_name,
            to_db,
            to_table,
            serde,
            fix_placeholder: is_spark_sql_table && fix_spark_placeholder,
        };
        target.apply(&mut self.sd, transform)?;
        self.db_name = to_db.to_string();
        self.table_name = to_table.to_string();
        Ok(())
    }
}

struct Retarget<'a> {
    from_db: &'a str,
    from_table: &'a str,
    to_db: &'a str,
    to_table: &'a str,
    serde: &'a str,
    fix_placeholder: bool,
}

impl Retarget<'_> {
    fn apply(
        &self,
        sd: &mut StorageDescriptor,
        transform: &LocationTransform,
    ) -> MetastoreResult<()> {
        if !self.serde.is_empty() {
            sd.serde_info.name = self.serde.to_string();
        }

        if let Some(path) = sd.serde_info.parameters.get_mut(SPARK_SQL_PATH_KEY) {
            *path = transform.apply(path)?;
        }

        sd.location = transform.apply(&sd.location)?;
        if self.fix_placeholder {
            if let Some(location) = self.rename_placeholder(&sd.location) {
                sd.location = location;
            }
        }
        Ok(())
    }

    /// `{root}/{from_db}.db/{from_table}-__PLACEHOLDER__` becomes
    /// `{root}/{to_db}.db/{to_table}-__PLACEHOLDER__`.
    ///
    /// Placeholder locations whose tail does not name the source table only
    /// have the last segment renamed.
    fn rename_placeholder(&self, location: &str) -> Option<String> {
        let stem = location.strip_suffix(SPARK_SQL_PLACEHOLDER_SUFFIX)?;
        let qualified = format!("{}.db/{}", self.from_db, self.from_table);

        let root = match stem.strip_suffix(&qualified) {
            Some(root) => format!("{root}{}.db/", self.to_db),
            None => match stem.rfind('/') {
                Some(idx) => stem[..=idx].to_string(),
                None => String::new(),
            },
        };
        Some(format!("{root}{}{SPARK_SQL_PLACEHOLDER_SUFFIX}", self.to_table))
    }
}
