//! Summary of a merge run.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Record count of one input file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSummary {
    pub path: PathBuf,
    pub records: usize,
}

/// What a call to [`crate::merge`] did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeReport {
    /// Per-input record counts, in command-line order
    pub inputs: Vec<InputSummary>,

    /// Rows after stacking all inputs
    pub stacked_records: usize,

    /// Rows folded into a surviving record
    pub duplicates_removed: usize,

    /// Rows after deduplication (one per duplicate cluster)
    pub unique_records: usize,

    /// Records with a non-empty abstract
    pub complete_records: usize,

    /// Records without an abstract
    pub incomplete_records: usize,

    /// Mother-IDs minted during this run
    pub minted_ids: usize,

    /// Where the complete records were written
    pub output: PathBuf,

    /// Where the incomplete records were written, if any
    pub incomplete_output: Option<PathBuf>,
}

impl MergeReport {
    /// Total records across all inputs
    pub fn input_records(&self) -> usize {
        self.inputs.iter().map(|i| i.records).sum()
    }
}
