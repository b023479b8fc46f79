//! Per-row match keys: persistent identifier and normalized text.

use super::normalize::normalize_text;
use crate::models::Table;

/// Resolve the persistent-identifier key of every row.
///
/// A missing column means identifier matching is skipped for the whole
/// table, so every row resolves to `None`. Otherwise values are trimmed and
/// blank values are absent.
pub fn resolve_identifier_keys(table: &Table, pid: &str) -> Vec<Option<String>> {
    match table.column_values(pid) {
        Some(values) => values
            .into_iter()
            .map(|v| {
                let v = v?.trim();
                (!v.is_empty()).then(|| v.to_string())
            })
            .collect(),
        None => {
            tracing::debug!("No '{}' column, skipping identifier matching", pid);
            vec![None; table.len()]
        }
    }
}

/// Resolve the normalized text key of every row.
///
/// The configured text fields are joined with a space before normalizing;
/// fields the table does not have contribute nothing.
pub fn resolve_text_keys(table: &Table, text_fields: &[String]) -> Vec<Option<String>> {
    let columns: Vec<usize> = text_fields
        .iter()
        .filter_map(|f| table.column_index(f))
        .collect();

    (0..table.len())
        .map(|row| {
            let joined = columns
                .iter()
                .map(|&col| table.get_at(row, col).unwrap_or(""))
                .collect::<Vec<_>>()
                .join(" ");
            normalize_text(Some(&joined))
        })
        .collect()
}

/// Both match keys of one row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowKeys {
    pub identifier: Option<String>,
    pub text: Option<String>,
}

/// Resolve both keys for every row
pub fn resolve_keys(table: &Table, pid: &str, text_fields: &[String]) -> Vec<RowKeys> {
    resolve_identifier_keys(table, pid)
        .into_iter()
        .zip(resolve_text_keys(table, text_fields))
        .map(|(identifier, text)| RowKeys { identifier, text })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[(&str, &str, &str)]) -> Table {
        let mut table = Table::with_headers(["title", "abstract", "doi"]);
        for (title, abstract_text, doi) in rows {
            table.push_row(
                [title, abstract_text, doi]
                    .iter()
                    .map(|v| (!v.is_empty()).then(|| v.to_string()))
                    .collect(),
            );
        }
        table
    }

    fn text_fields() -> Vec<String> {
        vec!["title".to_string(), "abstract".to_string()]
    }

    #[test]
    fn test_identifier_keys_trim_and_blank() {
        let mut t = table(&[("A", "", " 10.1/x "), ("B", "", ""), ("C", "", "x")]);
        t.set(2, "doi", Some("   ".to_string()));

        let keys = resolve_identifier_keys(&t, "doi");
        assert_eq!(keys, vec![Some("10.1/x".to_string()), None, None]);
    }

    #[test]
    fn test_missing_identifier_column() {
        let t = table(&[("A", "", "10.1/x")]);
        assert_eq!(resolve_identifier_keys(&t, "pmid"), vec![None]);
    }

    #[test]
    fn test_text_keys_join_fields() {
        let t = table(&[("Foo", "Bar", ""), ("", "", "10.1/x")]);
        let keys = resolve_text_keys(&t, &text_fields());
        assert_eq!(keys, vec![Some("foobar".to_string()), None]);
    }

    #[test]
    fn test_text_keys_ignore_unknown_fields() {
        let t = table(&[("Foo", "", "")]);
        let fields = vec!["title".to_string(), "keywords".to_string()];
        assert_eq!(resolve_text_keys(&t, &fields), vec![Some("foo".to_string())]);
    }
}
