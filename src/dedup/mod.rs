//! Duplicate detection and cross-source provenance merging.
//!
//! This module provides the decision logic of a merge run:
//!
//! - [`normalize_text`]: Canonicalize a title/abstract for equality matching
//! - [`resolve_identifier_keys`] / [`resolve_text_keys`]: Per-row match keys
//! - [`classify`]: Flag subsequent occurrences of an already-seen key
//! - [`fold_duplicates`]: Fold duplicates' source-attribution columns onto the surviving row
//! - [`assign_mother_ids`]: Give every surviving record a stable mother-ID
//! - [`reconcile_columns`]: Drop artifact columns, move provenance columns last
//! - [`split_by_abstract`]: Separate records without an abstract
//!
//! # Deduplication
//!
//! ```rust
//! use research_merge::dedup::deduplicate_table;
//! use research_merge::models::{Column, ColumnRole, Table};
//!
//! let mut table = Table::new(vec![
//!     Column::data("title"),
//!     Column::data("doi"),
//!     Column::new("a.csv", ColumnRole::SourcePresence),
//!     Column::new("b.csv", ColumnRole::SourcePresence),
//! ]);
//! table.push_row(vec![Some("Foo Bar".into()), Some("10.1/x".into()), Some("1".into()), Some("0".into())]);
//! table.push_row(vec![Some("foo   bar!!".into()), None, Some("0".into()), Some("1".into())]);
//!
//! let fields = vec!["title".to_string()];
//! let summary = deduplicate_table(&mut table, "doi", &fields);
//! assert_eq!(summary.folded_rows, 1);
//! assert_eq!(table.get(0, "b.csv"), Some("1"));
//! ```

mod attribution;
mod classify;
mod columns;
mod identity;
mod mother_id;
mod normalize;
mod split;

pub use attribution::{
    fill_presence_columns, fold_duplicates, fold_source_lists, format_source_list, is_present,
    parse_source_list, FoldSummary, ABSENT_FROM_SOURCE, PRESENT_IN_SOURCE, SOURCE_LIST_COLUMN,
};
pub use classify::{classify, duplicated, Classification, ClusterIndex, MatchKey};
pub use columns::{is_artifact_column, reconcile_columns};
pub use identity::{resolve_identifier_keys, resolve_keys, resolve_text_keys, RowKeys};
pub use mother_id::{
    assign_mother_ids, assign_mother_ids_from, next_sequence, parse_sequence, MotherIdError,
};
pub use normalize::normalize_text;
pub use split::{split_by_abstract, SplitDataset};

use crate::models::{ColumnRole, Table};

/// Classify the table and fold every duplicate into its surviving record.
///
/// Source-attribution and mother-ID columns are taken from the table's
/// column roles. A `name_of_database` source list, if present, is folded
/// too.
pub fn deduplicate_table(table: &mut Table, pid: &str, text_fields: &[String]) -> FoldSummary {
    let keys = resolve_keys(table, pid, text_fields);
    let classification = classify(&keys);
    tracing::info!(
        "Found {} duplicates among {} records",
        classification.duplicate_count(),
        table.len()
    );

    fold_source_lists(table, &classification, SOURCE_LIST_COLUMN);

    let mut columns = table.attribution_columns();
    columns.extend(table.columns_with_role(ColumnRole::MotherId));
    let summary = fold_duplicates(table, &classification, &columns);
    if summary.label_conflicts > 0 {
        tracing::warn!(
            "{} conflicting inclusion labels resolved by keeping the last one",
            summary.label_conflicts
        );
    }
    summary
}
