//! Catalog bridge communication.
//!
//! A bridge is an external process that fronts a real catalog (Hive thrift,
//! Glue, a REST catalog). metasync talks to it over NDJSON on stdin/stdout.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     NDJSON      ┌────────────────┐
//! │  BridgeCatalog   │ ──────────────▶ │ bridge process │ ──▶ catalog
//! │  (ReadClient +   │ ◀────────────── │ (stdin/stdout) │
//! │   WriteClient)   │                 └────────────────┘
//! └──────────────────┘
//!          │
//!          ▼
//!   BridgeClient (id correlation, timeouts)
//! ```
//!
//! # Protocol
//!
//! Request: `{"id": "uuid", "method": "catalog.get_table", "params": {...}}`
//! Response: `{"id": "uuid", "success": true, "result": {...}}`
//! Error: `{"id": "uuid", "success": false, "error": {"code": "...", "message": "..."}}`

mod catalog;
mod client;
mod error;
pub mod protocol;

pub use catalog::BridgeCatalog;
pub use client::{BridgeClient, DEFAULT_TIMEOUT_SECS};
pub use error::{BridgeError, BridgeResult};
