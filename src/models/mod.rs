//! Core data models for datasets and merge results.

mod report;
mod table;

pub use report::{InputSummary, MergeReport};
pub use table::{Cell, Column, ColumnRole, Table, LABEL_PREFIX};
