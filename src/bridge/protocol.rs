//! Protocol types for catalog bridge communication.
//!
//! Requests and responses are single JSON lines. Entity payloads use the
//! same field names as [`crate::metastore`] types.

use serde::{Deserialize, Serialize};

use crate::metastore::{Database, Partition, Table};

// ============================================================================
// Request/Response Envelope
// ============================================================================

/// Request envelope sent to the bridge.
#[derive(Debug, Clone, Serialize)]
pub struct RequestEnvelope {
    /// Unique request ID for correlation.
    pub id: String,
    /// Method name (e.g., "catalog.get_table").
    pub method: String,
    /// Method-specific parameters.
    pub params: serde_json::Value,
}

/// Response envelope received from the bridge.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseEnvelope {
    /// Request ID this response corresponds to.
    pub id: String,
    /// Whether the request succeeded.
    pub success: bool,
    /// Result data (present if success = true).
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    /// Error information (present if success = false).
    #[serde(default)]
    pub error: Option<ErrorInfo>,
}

/// Error information in a failed response.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorInfo {
    /// Error code (`NOT_FOUND`, `SCHEMA_EXISTS`, ...).
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

// ============================================================================
// Request Parameters
// ============================================================================

/// Identifies a table.
#[derive(Debug, Clone, Serialize)]
pub struct TableParams<'a> {
    pub db: &'a str,
    pub table: &'a str,
}

/// Identifies a partition.
#[derive(Debug, Clone, Serialize)]
pub struct PartitionParams<'a> {
    pub db: &'a str,
    pub table: &'a str,
    pub values: &'a [String],
}

/// Parameters for `catalog.get_databases`.
#[derive(Debug, Clone, Serialize)]
pub struct GetDatabasesParams<'a> {
    pub pattern: &'a str,
}

/// Parameters for `catalog.get_database`.
#[derive(Debug, Clone, Serialize)]
pub struct GetDatabaseParams<'a> {
    pub name: &'a str,
}

/// Parameters for `catalog.get_tables`.
#[derive(Debug, Clone, Serialize)]
pub struct GetTablesParams<'a> {
    pub db: &'a str,
    pub pattern: &'a str,
}

/// Parameters for `catalog.create_table`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateTableParams<'a> {
    pub table: &'a Table,
}

/// Parameters for `catalog.alter_table`.
#[derive(Debug, Clone, Serialize)]
pub struct AlterTableParams<'a> {
    pub db: &'a str,
    pub table: &'a str,
    pub new_table: &'a Table,
}

/// Parameters for the batch partition writes.
#[derive(Debug, Clone, Serialize)]
pub struct PartitionsParams<'a> {
    pub db: &'a str,
    pub table: &'a str,
    pub partitions: &'a [Partition],
}

/// Parameters for the single partition writes.
#[derive(Debug, Clone, Serialize)]
pub struct PartitionWriteParams<'a> {
    pub db: &'a str,
    pub table: &'a str,
    pub partition: &'a Partition,
}

/// Parameters for `catalog.create_database`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateDatabaseParams<'a> {
    pub database: &'a Database,
}

// ============================================================================
// Responses
// ============================================================================

/// Response from `catalog.get_table`.
#[derive(Debug, Clone, Deserialize)]
pub struct GetTableResponse {
    pub table: Table,
}

/// Response from `catalog.has_table`.
#[derive(Debug, Clone, Deserialize)]
pub struct HasTableResponse {
    pub exists: bool,
}

/// Response from `catalog.get_partitions`.
#[derive(Debug, Clone, Deserialize)]
pub struct GetPartitionsResponse {
    #[serde(default)]
    pub partitions: Vec<Partition>,
}

/// Response from `catalog.get_partition`; `null` when absent.
#[derive(Debug, Clone, Deserialize)]
pub struct GetPartitionResponse {
    #[serde(default)]
    pub partition: Option<Partition>,
}

/// Response from `catalog.get_database`.
#[derive(Debug, Clone, Deserialize)]
pub struct GetDatabaseResponse {
    pub database: Database,
}

/// Response from `catalog.get_databases`.
#[derive(Debug, Clone, Deserialize)]
pub struct GetDatabasesResponse {
    #[serde(default)]
    pub databases: Vec<Database>,
}

/// Response from `catalog.get_tables`.
#[derive(Debug, Clone, Deserialize)]
pub struct GetTablesResponse {
    #[serde(default)]
    pub tables: Vec<Table>,
}

// ============================================================================
// Method Names
// ============================================================================

/// Method name constants.
pub mod methods {
    pub const GET_TABLE: &str = "catalog.get_table";
    pub const HAS_TABLE: &str = "catalog.has_table";
    pub const GET_PARTITIONS: &str = "catalog.get_partitions";
    pub const GET_PARTITION: &str = "catalog.get_partition";
    pub const GET_DATABASE: &str = "catalog.get_database";
    pub const GET_DATABASES: &str = "catalog.get_databases";
    pub const GET_TABLES: &str = "catalog.get_tables";
    pub const CREATE_TABLE: &str = "catalog.create_table";
    pub const ALTER_TABLE: &str = "catalog.alter_table";
    pub const ADD_PARTITIONS: &str = "catalog.add_partitions";
    pub const ALTER_PARTITIONS: &str = "catalog.alter_partitions";
    pub const ALTER_PARTITION: &str = "catalog.alter_partition";
    pub const ADD_PARTITION: &str = "catalog.add_partition";
    pub const DROP_PARTITION: &str = "catalog.drop_partition";
    pub const CREATE_DATABASE: &str = "catalog.create_database";
}
