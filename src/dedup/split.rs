//! Splitting a merged dataset by abstract availability.

use crate::models::Table;

/// Records with and without an abstract
#[derive(Debug, Clone, PartialEq)]
pub struct SplitDataset {
    pub complete: Table,
    /// `None` when every record has an abstract
    pub incomplete: Option<Table>,
}

/// Partition rows on whether the abstract is empty or absent.
///
/// Both parts keep the row order and the full column set.
pub fn split_by_abstract(table: &Table, abstract_column: &str) -> SplitDataset {
    let (complete, incomplete): (Vec<usize>, Vec<usize>) = (0..table.len())
        .partition(|&row| table.get(row, abstract_column).is_some_and(|a| !a.is_empty()));

    SplitDataset {
        complete: table.select_rows(&complete),
        incomplete: (!incomplete.is_empty()).then(|| table.select_rows(&incomplete)),
    }
}
