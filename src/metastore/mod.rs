//! Catalog model and reconciliation engine.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     sync (orchestrator)                         │
//! │   copy_or_merge · copy · merge · copy_partition · copy_db       │
//! │   copy_or_merge_all · import_all · get_diff                     │
//! └─────────────────────────────────────────────────────────────────┘
//!        │ reads                │ mutates               │ diffs
//!        ▼                      ▼                       ▼
//! ┌──────────────┐   ┌─────────────────────┐   ┌──────────────────┐
//! │  ReadClient  │   │ Table/Partition     │   │ diff_iterable    │
//! │  WriteClient │   │ ::update            │   │ (merge-join over │
//! │  (I/O edge)  │   │ └ LocationTransform │   │  Collections)    │
//! └──────────────┘   └─────────────────────┘   └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use metasync::metastore::{copy_or_merge, LocationTransform, MemoryCatalog, TableSync};
//!
//! let request = TableSync::new("src", "sales", "dst", "sales");
//! let transform = LocationTransform::branch("", "dev");
//! copy_or_merge(&source, &target, &request, &transform).await?;
//! ```

mod client;
mod diff;
mod error;
mod location;
pub mod memory;
mod mutate;
mod sync;
mod types;

pub use client::{Client, ReadClient, WriteClient};
pub use diff::{
    diff, diff_iterable, Collection, ColumnCollection, Difference, DifferenceType, Differences,
    MetaDiff, PartitionCollection,
};
pub use error::{MetastoreError, MetastoreResult};
pub use location::{
    handle_dbfs_location, import_location, replace_branch_name, symlink_location,
    LocationTransform, DBFS_PREFIX,
};
pub use memory::MemoryCatalog;
pub use sync::{
    copy, copy_db, copy_or_merge, copy_or_merge_all, copy_or_merge_from_values,
    copy_or_merge_to_symlink, copy_partition, get_diff, import_all, merge, BatchSync,
    Destination, SyncReport, TableFailure, TableSync,
};
pub use types::*;
