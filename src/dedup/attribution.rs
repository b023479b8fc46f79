//! Folding duplicate rows' provenance onto their surviving record.

use super::classify::Classification;
use crate::models::{ColumnRole, Table};

/// Placeholder of a source-presence cell whose source did not contain the record
pub const ABSENT_FROM_SOURCE: &str = "0";

/// Value of a source-presence cell whose source contained the record
pub const PRESENT_IN_SOURCE: &str = "1";

/// Whether a presence cell says "this source contained the record"
pub fn is_present(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        Some(v) => v == PRESENT_IN_SOURCE || v.parse::<f64>().map_or(false, |n| n == 1.0),
        None => false,
    }
}

/// Set every non-present cell of the given presence columns to `"0"`
pub fn fill_presence_columns(table: &mut Table, columns: &[String]) {
    for column in columns {
        let Some(col) = table.column_index(column) else {
            continue;
        };
        for row in 0..table.len() {
            if !is_present(table.get_at(row, col)) {
                table.set_at(row, col, Some(ABSENT_FROM_SOURCE.to_string()));
            }
        }
    }
}

/// Column listing, per record, every input a stacked record was found in
pub const SOURCE_LIST_COLUMN: &str = "name_of_database";

/// Render source names as `['a.csv','b.csv']`
pub fn format_source_list<S: AsRef<str>>(sources: &[S]) -> String {
    let quoted: Vec<String> = sources
        .iter()
        .map(|s| format!("'{}'", s.as_ref()))
        .collect();
    format!("[{}]", quoted.join(","))
}

/// Source names of a list cell. A bare `'a.csv'` or `a.csv` is a list of one.
pub fn parse_source_list(value: &str) -> Vec<String> {
    let value = value.trim();
    let inner = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .unwrap_or(value);
    inner
        .split(',')
        .map(|s| s.trim().trim_matches('\'').trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Append every duplicate's source names to its canonical row's list.
///
/// Names keep their first-seen order and appear once. Must run before the
/// duplicates are dropped. Returns the number of duplicates that added a
/// name to their canonical row.
pub fn fold_source_lists(
    table: &mut Table,
    classification: &Classification,
    column: &str,
) -> usize {
    let Some(col) = table.column_index(column) else {
        return 0;
    };

    let mut lists: Vec<Vec<String>> = (0..table.len())
        .map(|row| table.get_at(row, col).map(parse_source_list).unwrap_or_default())
        .collect();

    let mut extended = 0;
    for (dup, canonical) in classification.pairs() {
        let mut added = false;
        for name in std::mem::take(&mut lists[dup]) {
            if !lists[canonical].contains(&name) {
                lists[canonical].push(name);
                added = true;
            }
        }
        extended += usize::from(added);
    }

    for (row, list) in lists.iter().enumerate() {
        if classification.duplicate[row] || list.is_empty() {
            continue;
        }
        table.set_at(row, col, Some(format_source_list(list.as_slice())));
    }
    extended
}

/// Counts of what a fold changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FoldSummary {
    /// Rows removed from the table
    pub folded_rows: usize,
    /// Presence cells switched to present on surviving rows
    pub presence_updates: usize,
    /// Label cells written onto surviving rows
    pub label_updates: usize,
    /// Label writes that replaced a different existing label
    pub label_conflicts: usize,
    /// Mother-IDs moved from a dropped row onto a survivor without one
    pub mother_ids_carried: usize,
}

/// Fold every duplicate row into its canonical row and drop the duplicates.
///
/// For each duplicate, in row order, and each listed attribution column:
/// a present presence cell sets the canonical cell to present, and a
/// non-absent label cell overwrites the canonical label (the last duplicate
/// processed wins). A mother-ID on the duplicate moves to a canonical row
/// that has none; an existing one is never replaced. Defaults on the
/// duplicate never overwrite the canonical row, and columns outside the list
/// are left as the canonical row has them.
pub fn fold_duplicates(
    table: &mut Table,
    classification: &Classification,
    attribution_columns: &[String],
) -> FoldSummary {
    let columns: Vec<(usize, ColumnRole)> = attribution_columns
        .iter()
        .filter_map(|name| Some((table.column_index(name)?, table.role_of(name)?)))
        .collect();

    let mut summary = FoldSummary::default();

    for (dup, canonical) in classification.pairs() {
        for &(col, role) in &columns {
            let value = table.get_at(dup, col).map(str::to_string);
            match role {
                ColumnRole::SourcePresence => {
                    if is_present(value.as_deref()) && !is_present(table.get_at(canonical, col)) {
                        table.set_at(canonical, col, Some(PRESENT_IN_SOURCE.to_string()));
                        summary.presence_updates += 1;
                    }
                }
                ColumnRole::InclusionLabel => {
                    let Some(label) = value else {
                        continue;
                    };
                    match table.get_at(canonical, col) {
                        Some(existing) if existing == label => continue,
                        Some(existing) => {
                            tracing::warn!(
                                "Conflicting '{}' labels for row {}: '{}' replaced by '{}' from row {}",
                                table.columns()[col].name,
                                canonical,
                                existing,
                                label,
                                dup
                            );
                            summary.label_conflicts += 1;
                        }
                        None => {}
                    }
                    table.set_at(canonical, col, Some(label));
                    summary.label_updates += 1;
                }
                ColumnRole::MotherId => {
                    let Some(id) = value.filter(|id| !id.trim().is_empty()) else {
                        continue;
                    };
                    match table.get_at(canonical, col).map(str::trim) {
                        Some(existing) if !existing.is_empty() => {
                            if existing != id.trim() {
                                tracing::debug!(
                                    "Row {} keeps mother-ID '{}', retiring '{}' from row {}",
                                    canonical,
                                    existing,
                                    id,
                                    dup
                                );
                            }
                        }
                        _ => {
                            table.set_at(canonical, col, Some(id));
                            summary.mother_ids_carried += 1;
                        }
                    }
                }
                ColumnRole::Data => {}
            }
        }
    }

    let keep: Vec<bool> = classification.duplicate.iter().map(|d| !d).collect();
    summary.folded_rows = classification.duplicate_count();
    table.retain_rows(&keep);
    summary
}
