//! End-to-end merge runs.
//!
//! [`merge`] loads every input, tags each record with the file it came from,
//! collapses duplicates across files, assigns mother-IDs and writes the
//! records with an abstract to the output file and the others to a sibling
//! file.

use std::path::{Path, PathBuf};

use crate::config::{Config, Field};
use crate::dedup::{
    assign_mother_ids_from, deduplicate_table, fill_presence_columns, format_source_list,
    next_sequence, reconcile_columns, split_by_abstract, MotherIdError, PRESENT_IN_SOURCE,
    SOURCE_LIST_COLUMN,
};
use crate::io::{self, DatasetError, MixedFormatError};
use crate::models::{ColumnRole, InputSummary, MergeReport, Table, LABEL_PREFIX};

/// Label value meaning "not labelled" in screening exports
const UNLABELED: &str = "-1";

/// Errors that abort a merge run
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// Inputs and output belong to different file families
    #[error(transparent)]
    MixedFormat(#[from] MixedFormatError),

    /// An existing mother-ID has no parseable sequence number
    #[error(transparent)]
    UnresolvableIdentifier(#[from] MotherIdError),

    /// An input has no title or abstract column under any accepted header
    #[error("No '{field}' column found in {}", .path.display())]
    MissingColumn { field: &'static str, path: PathBuf },

    /// Loading or writing a dataset failed
    #[error(transparent)]
    Dataset(DatasetError),
}

impl From<DatasetError> for MergeError {
    fn from(err: DatasetError) -> Self {
        match err {
            DatasetError::MissingColumn { field, path } => MergeError::MissingColumn { field, path },
            other => MergeError::Dataset(other),
        }
    }
}

/// Merge `inputs` into `output`, collapsing duplicate records.
///
/// Records without an abstract go to a sibling of `output` named with the
/// configured incomplete suffix; that file is only written when there are
/// such records. An input equal to `output` is treated as a previous merge
/// result: it gets no presence column of its own and its mother-IDs and
/// provenance columns are carried over.
pub fn merge(output: &Path, inputs: &[PathBuf], config: &Config) -> Result<MergeReport, MergeError> {
    io::check_file_families(inputs, output)?;

    let settings = &config.merge;
    let (tables, summaries) = load_inputs(output, inputs, config)?;

    let mut table = Table::vstack(tables);
    let stacked_records = table.len();
    let presence = table.columns_with_role(ColumnRole::SourcePresence);
    fill_presence_columns(&mut table, &presence);
    tracing::info!(
        "Stacked {} records from {} inputs ({} source columns)",
        stacked_records,
        inputs.len(),
        presence.len()
    );

    // Sequence numbers of rows dropped below stay retired
    let reserved = next_sequence(&table, &settings.mother_id_column)?;
    let fold = deduplicate_table(&mut table, &settings.pid, &settings.text_fields);
    let minted_ids = assign_mother_ids_from(
        &mut table,
        &settings.mother_id_column,
        &settings.mother_id_prefix,
        reserved,
    )?;
    reconcile_columns(&mut table);

    let split = split_by_abstract(&table, Field::Abstract.name());
    io::write(&split.complete, output)?;
    tracing::info!("Wrote {} records to {}", split.complete.len(), output.display());

    let mut report = MergeReport {
        inputs: summaries,
        stacked_records,
        duplicates_removed: fold.folded_rows,
        unique_records: table.len(),
        complete_records: split.complete.len(),
        incomplete_records: 0,
        minted_ids,
        output: output.to_path_buf(),
        incomplete_output: None,
    };

    if let Some(incomplete) = split.incomplete {
        let path = incomplete_output_path(output, &settings.incomplete_suffix);
        io::write(&incomplete, &path)?;
        tracing::info!(
            "Wrote {} records without abstract to {}",
            incomplete.len(),
            path.display()
        );
        report.incomplete_records = incomplete.len();
        report.incomplete_output = Some(path);
    }

    Ok(report)
}

/// Collapse duplicates of an already loaded dataset.
///
/// Rows match on the `pid` column or on the normalized text fields; each
/// duplicate's source-attribution columns are folded onto the first row of
/// its cluster and the duplicate is dropped.
pub fn deduplicate(mut table: Table, pid: &str, text_fields: &[String]) -> Table {
    deduplicate_table(&mut table, pid, text_fields);
    table
}

/// Stack `inputs` into `output`, collapsing duplicates.
///
/// Every record gets its source-presence columns and a `name_of_database`
/// list of the inputs it was found in; duplicates are folded into their
/// first occurrence. No mother-IDs are assigned and nothing is split off.
pub fn stack(output: &Path, inputs: &[PathBuf], config: &Config) -> Result<MergeReport, MergeError> {
    io::check_file_families(inputs, output)?;

    let settings = &config.merge;
    let (mut tables, summaries) = load_inputs(output, inputs, config)?;
    for (table, path) in tables.iter_mut().zip(inputs) {
        tag_source_list(table, path);
    }

    let mut table = Table::vstack(tables);
    let stacked_records = table.len();
    let presence = table.columns_with_role(ColumnRole::SourcePresence);
    fill_presence_columns(&mut table, &presence);

    let fold = deduplicate_table(&mut table, &settings.pid, &settings.text_fields);
    reconcile_columns(&mut table);

    io::write(&table, output)?;
    tracing::info!("Stacked {} records into {}", table.len(), output.display());

    Ok(MergeReport {
        inputs: summaries,
        stacked_records,
        duplicates_removed: fold.folded_rows,
        unique_records: table.len(),
        complete_records: table.len(),
        output: output.to_path_buf(),
        ..Default::default()
    })
}

/// Record `path` in the source list of every row that has none yet
fn tag_source_list(table: &mut Table, path: &Path) {
    let list = format_source_list(&[path.display().to_string()]);
    table.add_column(SOURCE_LIST_COLUMN, ColumnRole::Data, None);
    if let Some(col) = table.column_index(SOURCE_LIST_COLUMN) {
        for row in 0..table.len() {
            if table.get_at(row, col).map_or(true, |v| v.trim().is_empty()) {
                table.set_at(row, col, Some(list.clone()));
            }
        }
    }
}

/// Path for records without an abstract: `<stem><suffix>.<ext>` next to `output`
pub fn incomplete_output_path(output: &Path, suffix: &str) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match output.extension() {
        Some(ext) => format!("{}{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}{}", stem, suffix),
    };
    output.with_file_name(name)
}

fn load_inputs(
    output: &Path,
    inputs: &[PathBuf],
    config: &Config,
) -> Result<(Vec<Table>, Vec<InputSummary>), MergeError> {
    let mut tables = Vec::with_capacity(inputs.len());
    let mut summaries = Vec::with_capacity(inputs.len());

    for path in inputs {
        let mut table = io::load(path, &config.columns, &config.merge.mother_id_column)?;
        summaries.push(InputSummary {
            path: path.clone(),
            records: table.len(),
        });
        tracing::info!("{} records in {}", table.len(), path.display());

        tag_source(&mut table, path, same_file(path, output));
        tables.push(table);
    }

    Ok((tables, summaries))
}

/// Attach per-source provenance to a freshly loaded input.
///
/// The `included` column becomes `included_<source>` with `-1` treated as
/// unlabelled, and unless the input is the output of a previous merge, a
/// `<source>` presence column set to `1` is added.
pub fn tag_source(table: &mut Table, path: &Path, is_previous_output: bool) {
    let source = path.display().to_string();
    let included = Field::Included.name();

    if let Some(col) = table.column_index(included) {
        for row in 0..table.len() {
            if table.get_at(row, col).map(str::trim) == Some(UNLABELED) {
                table.set_at(row, col, None);
            }
        }

        let label_column = format!("{}{}", LABEL_PREFIX, source);
        if table.rename_column(included, &label_column) {
            table.set_role(&label_column, ColumnRole::InclusionLabel);
        } else {
            tracing::warn!(
                "{} already has a '{}' column, keeping '{}' as data",
                path.display(),
                label_column,
                included
            );
        }
    }

    if is_previous_output {
        tracing::debug!("{} is the merge output, not tagging it as a source", path.display());
        return;
    }

    table.add_column(source.clone(), ColumnRole::SourcePresence, None);
    if let Some(col) = table.column_index(&source) {
        for row in 0..table.len() {
            table.set_at(row, col, Some(PRESENT_IN_SOURCE.to_string()));
        }
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incomplete_output_path() {
        assert_eq!(
            incomplete_output_path(Path::new("out/merged.csv"), "_missing_AB"),
            PathBuf::from("out/merged_missing_AB.csv")
        );
        assert_eq!(
            incomplete_output_path(Path::new("merged"), "_x"),
            PathBuf::from("merged_x")
        );
    }

    #[test]
    fn test_tag_source() {
        let mut table = Table::with_headers(["title", "abstract", "included"]);
        table.push_row(vec![Some("A".into()), None, Some("1".into())]);
        table.push_row(vec![Some("B".into()), None, Some("-1".into())]);

        tag_source(&mut table, Path::new("a.csv"), false);

        assert_eq!(
            table.headers(),
            vec!["title", "abstract", "included_a.csv", "a.csv"]
        );
        assert_eq!(
            table.role_of("included_a.csv"),
            Some(ColumnRole::InclusionLabel)
        );
        assert_eq!(table.role_of("a.csv"), Some(ColumnRole::SourcePresence));
        assert_eq!(
            table.column_values("included_a.csv").unwrap(),
            vec![Some("1"), None]
        );
        assert_eq!(
            table.column_values("a.csv").unwrap(),
            vec![Some("1"), Some("1")]
        );
    }

    #[test]
    fn test_tag_previous_output() {
        let mut table = Table::with_headers(["title", "abstract"]);
        table.push_row(vec![Some("A".into()), None]);
        tag_source(&mut table, Path::new("merged.csv"), true);
        assert_eq!(table.headers(), vec!["title", "abstract"]);
    }

    #[test]
    fn test_deduplicate_standalone() {
        let mut table = Table::with_headers(["title", "abstract", "doi"]);
        table.push_row(vec![Some("Foo".into()), None, Some("10.1/x".into())]);
        table.push_row(vec![Some("Bar".into()), None, Some("10.1/x".into())]);
        table.push_row(vec![Some("Baz".into()), None, None]);

        let fields = vec!["title".to_string(), "abstract".to_string()];
        let table = deduplicate(table, "doi", &fields);
        assert_eq!(
            table.column_values("title").unwrap(),
            vec![Some("Foo"), Some("Baz")]
        );
    }

    #[test]
    fn test_missing_column_error_mapping() {
        let err: MergeError = DatasetError::MissingColumn {
            field: "title",
            path: PathBuf::from("a.csv"),
        }
        .into();
        assert!(matches!(err, MergeError::MissingColumn { field: "title", .. }));
    }
}
