//! # metasync
//!
//! Replicates table metadata between data catalogs.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                  CLI / config (metasync.toml)            │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │        metastore (copy / merge / diff / transforms)      │
//! └─────────────────────────────────────────────────────────┘
//!                          │ ReadClient / WriteClient
//!                          ▼
//! ┌────────────────────────────┐  ┌─────────────────────────┐
//! │  bridge (NDJSON process)   │  │  MemoryCatalog          │
//! └────────────────────────────┘  └─────────────────────────┘
//! ```

pub mod bridge;
pub mod config;
pub mod metastore;

pub use metastore::{Client, MetastoreError, MetastoreResult, ReadClient, WriteClient};
