//! Metastore error types.

use thiserror::Error;

use crate::bridge::BridgeError;

/// Result type for metastore operations.
pub type MetastoreResult<T> = Result<T, MetastoreError>;

/// Errors raised while reading from, or reconciling, metadata catalogs.
#[derive(Error, Debug)]
pub enum MetastoreError {
    /// A table, partition or database does not exist.
    #[error("not found: {entity}")]
    NotFound {
        /// Qualified name of the missing entity.
        entity: String,
    },

    /// The target catalog already holds a database with this name.
    #[error("schema already exists: {0}")]
    SchemaExists(String),

    /// A location string does not have the structure a rewrite expects.
    #[error("invalid location: {0}")]
    InvalidLocation(String),

    /// A client returned a payload of the wrong entity kind.
    #[error("unexpected type: expected {expected}, got {got}")]
    UnexpectedType {
        /// Entity kind the caller asked for.
        expected: &'static str,
        /// What actually came back.
        got: String,
    },

    /// Transport failure talking to a catalog bridge.
    #[error(transparent)]
    Bridge(BridgeError),

    /// Opaque error from any other client implementation.
    #[error("catalog client error: {0}")]
    Client(String),
}

impl MetastoreError {
    /// Create a not-found error for a qualified entity name.
    pub fn not_found(entity: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
        }
    }

    /// Check if this error reports an existing database.
    pub fn is_schema_exists(&self) -> bool {
        matches!(self, Self::SchemaExists(_))
    }

    /// Check if this error reports a missing entity.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<BridgeError> for MetastoreError {
    fn from(err: BridgeError) -> Self {
        // Bridges report catalog-level conditions as error codes; lift the
        // ones the orchestrator branches on into first-class variants.
        match err {
            BridgeError::Remote { code, message } if code == "SCHEMA_EXISTS" => {
                Self::SchemaExists(message)
            }
            BridgeError::Remote { code, message } if code == "NOT_FOUND" => {
                Self::NotFound { entity: message }
            }
            other => Self::Bridge(other),
        }
    }
}
