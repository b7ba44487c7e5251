//! Catalog entity types.
//!
//! These mirror the Hive metastore object model closely enough to round-trip
//! through any Hive-style catalog, while staying plain Rust records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Table parameter Spark SQL sets on datasource tables it creates.
pub const SPARK_SQL_PROVIDER_KEY: &str = "spark.sql.sources.provider";

/// SerDe parameter under which Spark stores the real data path.
pub const SPARK_SQL_PATH_KEY: &str = "path";

/// Suffix Spark appends to the placeholder location of datasource tables.
pub const SPARK_SQL_PLACEHOLDER_SUFFIX: &str = "-__PLACEHOLDER__";

/// A database (schema) in a catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Database {
    /// Database name, unique within a catalog.
    pub name: String,
    /// Storage location; empty when unset.
    pub location_uri: String,
    /// Free-form description.
    pub description: String,
    /// Catalog-specific parameters.
    pub parameters: BTreeMap<String, String>,
}

impl Database {
    /// Create a database with a name and location.
    pub fn new(name: impl Into<String>, location_uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location_uri: location_uri.into(),
            ..Default::default()
        }
    }
}

/// A column definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Column {
    /// Column name (diff key).
    pub name: String,
    /// Column type as the catalog spells it (e.g. `string`, `decimal(10,2)`).
    #[serde(rename = "type")]
    pub data_type: String,
    /// Optional comment.
    pub comment: String,
}

impl Column {
    /// Create a column with a name and type.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            comment: String::new(),
        }
    }
}

/// Serializer/deserializer information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerDeInfo {
    /// SerDe identifier.
    pub name: String,
    /// Implementing library class.
    pub serialization_lib: String,
    /// SerDe parameters.
    pub parameters: BTreeMap<String, String>,
}

/// Physical storage of a table or partition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageDescriptor {
    /// Storage location; empty when unset.
    pub location: String,
    /// Data columns, in declaration order.
    pub cols: Vec<Column>,
    /// Input format class.
    pub input_format: String,
    /// Output format class.
    pub output_format: String,
    /// SerDe information.
    pub serde_info: SerDeInfo,
}

/// A table definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Table {
    /// Owning database.
    pub db_name: String,
    /// Table name, unique within its database.
    pub table_name: String,
    /// Owner principal.
    pub owner: String,
    /// Table type (`EXTERNAL_TABLE`, `MANAGED_TABLE`, ...).
    pub table_type: String,
    /// Partition keys, in partition-tuple order.
    pub partition_keys: Vec<Column>,
    /// Table parameters.
    pub parameters: BTreeMap<String, String>,
    /// Storage descriptor.
    pub sd: StorageDescriptor,
}

impl Table {
    /// Create a table at a location with the given data columns.
    pub fn new(
        db_name: impl Into<String>,
        table_name: impl Into<String>,
        location: impl Into<String>,
        cols: Vec<Column>,
    ) -> Self {
        Self {
            db_name: db_name.into(),
            table_name: table_name.into(),
            sd: StorageDescriptor {
                location: location.into(),
                cols,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Whether Spark SQL created this table as a datasource table.
    ///
    /// Such tables keep their real path in the SerDe parameters and point
    /// the storage location at a placeholder.
    pub fn is_spark_sql_table(&self) -> bool {
        self.parameters.contains_key(SPARK_SQL_PROVIDER_KEY)
    }

    /// `db.table`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.db_name, self.table_name)
    }
}

/// A partition of a table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Partition {
    /// Owning database.
    pub db_name: String,
    /// Owning table.
    pub table_name: String,
    /// Partition key values, in partition-key order.
    pub values: Vec<String>,
    /// Partition parameters.
    pub parameters: BTreeMap<String, String>,
    /// Storage descriptor.
    pub sd: StorageDescriptor,
}

impl Partition {
    /// Create a partition of `db.table` at a location.
    pub fn new<V: Into<String>>(
        db_name: impl Into<String>,
        table_name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            db_name: db_name.into(),
            table_name: table_name.into(),
            values: values.into_iter().map(Into::into).collect(),
            sd: StorageDescriptor {
                location: location.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// The diff key: values joined with `/`.
    ///
    /// `%` and `/` inside a value are percent-escaped, as Hive does for
    /// partition paths, so distinct value tuples never share a key.
    pub fn key(&self) -> String {
        self.values
            .iter()
            .map(|v| escape_key_value(v))
            .collect::<Vec<_>>()
            .join("/")
    }
}

fn escape_key_value(value: &str) -> String {
    if !value.contains(['%', '/']) {
        return value.to_string();
    }
    value.replace('%', "%25").replace('/', "%2F")
}
