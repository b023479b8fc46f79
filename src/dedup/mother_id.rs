//! Stable mother-IDs for surviving records.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

use crate::models::{ColumnRole, Table};

static MOTHER_ID: OnceLock<Regex> = OnceLock::new();

fn mother_id_pattern() -> &'static Regex {
    MOTHER_ID.get_or_init(|| Regex::new(r"^\s*[A-Za-z]+(\d+)\s*$").expect("static pattern"))
}

/// Errors that can occur while assigning mother-IDs
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MotherIdError {
    /// An existing mother-ID without a parseable sequence number
    #[error("Cannot resolve mother-ID '{id}' in row {row}: expected a letter prefix followed by a number")]
    Unparseable { id: String, row: usize },

    /// No sequence number is left after the highest existing one
    #[error("Mother-ID sequence exhausted after {last}")]
    Exhausted { last: u64 },
}

/// Sequence number of a mother-ID such as `M42`
pub fn parse_sequence(id: &str) -> Option<u64> {
    mother_id_pattern()
        .captures(id)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
}

fn is_blank(id: Option<&str>) -> bool {
    id.map_or(true, |id| id.trim().is_empty())
}

/// First sequence number not used by any existing mother-ID in `column`.
///
/// Returns 0 when the column is missing or empty. Existing IDs are validated
/// here, so computing this on the stacked table before duplicates are
/// dropped keeps the IDs of dropped rows retired.
pub fn next_sequence(table: &Table, column: &str) -> Result<u64, MotherIdError> {
    let Some(values) = table.column_values(column) else {
        return Ok(0);
    };

    let mut highest: Option<u64> = None;
    let mut seen: HashSet<&str> = HashSet::new();
    for (row, id) in values.into_iter().enumerate() {
        let Some(id) = id.filter(|id| !is_blank(Some(id))) else {
            continue;
        };
        let sequence = parse_sequence(id).ok_or_else(|| MotherIdError::Unparseable {
            id: id.to_string(),
            row,
        })?;
        if !seen.insert(id.trim()) {
            tracing::warn!("Mother-ID '{}' appears more than once", id);
        }
        highest = highest.max(Some(sequence));
    }

    match highest {
        Some(last) => last.checked_add(1).ok_or(MotherIdError::Exhausted { last }),
        None => Ok(0),
    }
}

/// Give every row a mother-ID. Returns the number of IDs minted.
///
/// Existing IDs are kept. Rows without one get `<prefix><n>` with `n`
/// continuing after the highest existing sequence number, in row order.
/// Without a mother-ID column one is inserted first and numbering starts at 0.
pub fn assign_mother_ids(
    table: &mut Table,
    column: &str,
    prefix: &str,
) -> Result<usize, MotherIdError> {
    assign_mother_ids_from(table, column, prefix, 0)
}

/// Like [`assign_mother_ids`], but never minting a sequence number below
/// `reserved`.
pub fn assign_mother_ids_from(
    table: &mut Table,
    column: &str,
    prefix: &str,
    reserved: u64,
) -> Result<usize, MotherIdError> {
    let next = next_sequence(table, column)?.max(reserved);

    table.insert_column(0, column, ColumnRole::MotherId, None);
    let Some(col) = table.column_index(column) else {
        return Ok(0);
    };

    let mut minted = 0;
    let mut sequence = next;
    for row in 0..table.len() {
        if is_blank(table.get_at(row, col)) {
            if minted > 0 {
                sequence = sequence
                    .checked_add(1)
                    .ok_or(MotherIdError::Exhausted { last: sequence })?;
            }
            table.set_at(row, col, Some(format!("{}{}", prefix, sequence)));
            minted += 1;
        }
    }

    tracing::debug!("Minted {} mother-IDs starting at {}{}", minted, prefix, next);
    Ok(minted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with_ids(ids: &[Option<&str>]) -> Table {
        let mut table = Table::with_headers(["MID", "title"]);
        for (i, id) in ids.iter().enumerate() {
            table.push_row(vec![id.map(str::to_string), Some(format!("T{i}"))]);
        }
        table
    }

    #[test]
    fn test_parse_sequence() {
        assert_eq!(parse_sequence("M42"), Some(42));
        assert_eq!(parse_sequence("M0"), Some(0));
        assert_eq!(parse_sequence("R7"), Some(7));
        assert_eq!(parse_sequence("M"), None);
        assert_eq!(parse_sequence("42"), None);
        assert_eq!(parse_sequence("Mx1"), None);
    }

    #[test]
    fn test_continues_after_highest() {
        let mut table = table_with_ids(&[Some("M0"), None, Some("M3"), None]);
        let minted = assign_mother_ids(&mut table, "MID", "M").unwrap();
        assert_eq!(minted, 2);
        assert_eq!(
            table.column_values("MID").unwrap(),
            vec![Some("M0"), Some("M4"), Some("M3"), Some("M5")]
        );
    }

    #[test]
    fn test_creates_column_when_missing() {
        let mut table = Table::with_headers(["title"]);
        for t in ["A", "B", "C"] {
            table.push_row(vec![Some(t.to_string())]);
        }
        let minted = assign_mother_ids(&mut table, "MID", "M").unwrap();
        assert_eq!(minted, 3);
        assert_eq!(table.headers(), vec!["MID", "title"]);
        assert_eq!(table.role_of("MID"), Some(ColumnRole::MotherId));
        assert_eq!(
            table.column_values("MID").unwrap(),
            vec![Some("M0"), Some("M1"), Some("M2")]
        );
    }

    #[test]
    fn test_empty_column_starts_at_zero() {
        let mut table = table_with_ids(&[None, None]);
        assign_mother_ids(&mut table, "MID", "M").unwrap();
        assert_eq!(
            table.column_values("MID").unwrap(),
            vec![Some("M0"), Some("M1")]
        );
    }

    #[test]
    fn test_rerun_changes_nothing() {
        let mut table = table_with_ids(&[Some("M2"), None]);
        assign_mother_ids(&mut table, "MID", "M").unwrap();
        let before = table.clone();

        let minted = assign_mother_ids(&mut table, "MID", "M").unwrap();
        assert_eq!(minted, 0);
        assert_eq!(before.rows(), table.rows());
        assert_eq!(before.headers(), table.headers());
    }

    #[test]
    fn test_unparseable_id_fails() {
        let mut table = table_with_ids(&[Some("M1"), Some("legacy"), None]);
        let err = assign_mother_ids(&mut table, "MID", "M").unwrap_err();
        assert_eq!(
            err,
            MotherIdError::Unparseable {
                id: "legacy".to_string(),
                row: 1
            }
        );
    }

    #[test]
    fn test_sequence_exhausted() {
        let last = format!("M{}", u64::MAX);
        let mut table = table_with_ids(&[Some(last.as_str()), None]);
        let err = assign_mother_ids(&mut table, "MID", "M").unwrap_err();
        assert_eq!(err, MotherIdError::Exhausted { last: u64::MAX });
    }

    #[test]
    fn test_highest_possible_id_is_kept() {
        let last = format!("M{}", u64::MAX);
        let mut table = table_with_ids(&[Some(last.as_str())]);
        assert_eq!(assign_mother_ids(&mut table, "MID", "M").unwrap(), 0);
    }

    #[test]
    fn test_repeated_existing_ids_are_kept() {
        let mut table = table_with_ids(&[Some("M1"), Some("M1"), None]);
        let minted = assign_mother_ids(&mut table, "MID", "M").unwrap();
        assert_eq!(minted, 1);
        assert_eq!(
            table.column_values("MID").unwrap(),
            vec![Some("M1"), Some("M1"), Some("M2")]
        );
    }

    #[test]
    fn test_reserved_sequence_is_not_reused() {
        let mut table = table_with_ids(&[Some("M0"), None]);
        let minted = assign_mother_ids_from(&mut table, "MID", "M", 5).unwrap();
        assert_eq!(minted, 1);
        assert_eq!(
            table.column_values("MID").unwrap(),
            vec![Some("M0"), Some("M5")]
        );
    }

    #[test]
    fn test_next_sequence() {
        assert_eq!(next_sequence(&table_with_ids(&[Some("M4"), None]), "MID"), Ok(5));
        assert_eq!(next_sequence(&table_with_ids(&[None, Some(" ")]), "MID"), Ok(0));
        assert_eq!(next_sequence(&Table::with_headers(["title"]), "MID"), Ok(0));
    }
}
