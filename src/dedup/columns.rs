//! Final column shape of a merged dataset.

use regex::Regex;
use std::sync::OnceLock;

use crate::models::{ColumnRole, Table};

static INDEX_ARTIFACT: OnceLock<Regex> = OnceLock::new();

/// Headers left behind by index columns of spreadsheet tools (`Unnamed: 0`)
fn index_artifact_pattern() -> &'static Regex {
    INDEX_ARTIFACT.get_or_init(|| Regex::new(r"^Unnamed: ?\d+(_level_\d+)?$").expect("static pattern"))
}

/// Whether a header is an artifact of a previous read/write round trip
pub fn is_artifact_column(name: &str) -> bool {
    let name = name.trim();
    name.is_empty() || index_artifact_pattern().is_match(name)
}

/// Drop artifact columns and move provenance columns to the end.
///
/// The mother-ID column comes first, then data columns, then
/// source-presence columns, then inclusion-label columns, each group in its
/// original relative order. Returns the dropped headers.
pub fn reconcile_columns(table: &mut Table) -> Vec<String> {
    let dropped = table.drop_columns(|c| is_artifact_column(&c.name));
    if !dropped.is_empty() {
        tracing::debug!("Dropped artifact columns: {:?}", dropped);
    }

    let rank = |role: ColumnRole| match role {
        ColumnRole::MotherId => 0,
        ColumnRole::Data => 1,
        ColumnRole::SourcePresence => 2,
        ColumnRole::InclusionLabel => 3,
    };

    let mut order: Vec<usize> = (0..table.columns().len()).collect();
    order.sort_by_key(|&i| rank(table.columns()[i].role));
    if order.iter().enumerate().any(|(pos, &i)| pos != i) {
        table.reorder_columns(&order);
    }

    dropped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Column;

    #[test]
    fn test_is_artifact_column() {
        assert!(is_artifact_column(""));
        assert!(is_artifact_column("  "));
        assert!(is_artifact_column("Unnamed: 0"));
        assert!(is_artifact_column("Unnamed: 12"));
        assert!(!is_artifact_column("title"));
        assert!(!is_artifact_column("Unnamed author"));
    }

    #[test]
    fn test_reconcile_columns() {
        let mut table = Table::new(vec![
            Column::new("a.csv", ColumnRole::SourcePresence),
            Column::new("included_a.csv", ColumnRole::InclusionLabel),
            Column::data("Unnamed: 0"),
            Column::data("title"),
            Column::new("b.csv", ColumnRole::SourcePresence),
            Column::new("MID", ColumnRole::MotherId),
            Column::new("included_b.csv", ColumnRole::InclusionLabel),
            Column::data("abstract"),
        ]);
        table.push_row(
            ["1", "0", "7", "T", "0", "M0", "", "A"]
                .iter()
                .map(|v| (!v.is_empty()).then(|| v.to_string()))
                .collect(),
        );

        let dropped = reconcile_columns(&mut table);
        assert_eq!(dropped, vec!["Unnamed: 0".to_string()]);
        assert_eq!(
            table.headers(),
            vec![
                "MID",
                "title",
                "abstract",
                "a.csv",
                "b.csv",
                "included_a.csv",
                "included_b.csv"
            ]
        );
        assert_eq!(table.get(0, "title"), Some("T"));
        assert_eq!(table.get(0, "a.csv"), Some("1"));
        assert_eq!(table.get(0, "included_a.csv"), Some("0"));
        assert_eq!(table.get(0, "MID"), Some("M0"));
    }

    #[test]
    fn test_reconcile_is_stable() {
        let mut table = Table::new(vec![
            Column::data("title"),
            Column::new("a.csv", ColumnRole::SourcePresence),
        ]);
        let version = table.version();
        reconcile_columns(&mut table);
        assert_eq!(table.version(), version);
    }
}
