//! # Research Merge
//!
//! Merge several literature-search exports into one dataset, collapsing
//! duplicate records while keeping track of which source file(s) contained
//! each record and which inclusion label every source assigned to it.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (Table, ColumnRole, MergeReport)
//! - [`dedup`]: Duplicate detection and cross-source provenance merging
//! - [`io`]: Loading and writing tabular datasets, file-family checks
//! - [`pipeline`]: The `merge`, `deduplicate` and `stack` entry points
//! - [`config`]: Configuration management

pub mod config;
pub mod dedup;
pub mod io;
pub mod models;
pub mod pipeline;

// Re-export commonly used types
pub use models::{ColumnRole, MergeReport, Table};
pub use pipeline::{deduplicate, merge, stack, MergeError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
