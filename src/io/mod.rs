//! Loading and writing datasets.
//!
//! Only tabular files (`.csv`, `.tab`, `.tsv`) are read and written here.
//! Reference-manager files (`.ris`, `.txt`) and spreadsheets (`.xlsx`) are
//! recognised so that mixed-family runs can be rejected up front, but
//! loading them is reported as an unsupported format.

mod tabular;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::config::{ColumnDefinitions, Field};
use crate::models::{ColumnRole, Table};

/// Group of file types that may be mixed within one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFamily {
    /// Reference-manager exports (RIS and plain-text RIS)
    Reference,
    /// Spreadsheet-like files
    Tabular,
}

impl FileFamily {
    /// Family of a path, judged by its extension
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        DatasetFormat::from_path(path).map(DatasetFormat::family)
    }
}

/// Concrete on-disk format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Csv,
    Tsv,
    Xlsx,
    Ris,
}

impl DatasetFormat {
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        match extension(path.as_ref())?.as_str() {
            "csv" => Some(DatasetFormat::Csv),
            "tab" | "tsv" => Some(DatasetFormat::Tsv),
            "xlsx" => Some(DatasetFormat::Xlsx),
            "ris" | "txt" => Some(DatasetFormat::Ris),
            _ => None,
        }
    }

    pub fn family(self) -> FileFamily {
        match self {
            DatasetFormat::Csv | DatasetFormat::Tsv | DatasetFormat::Xlsx => FileFamily::Tabular,
            DatasetFormat::Ris => FileFamily::Reference,
        }
    }

    /// Whether this crate can read and write the format
    pub fn is_readable(self) -> bool {
        self.delimiter().is_some()
    }

    /// Field delimiter, for the formats this crate can read and write
    fn delimiter(self) -> Option<u8> {
        match self {
            DatasetFormat::Csv => Some(b','),
            DatasetFormat::Tsv => Some(b'\t'),
            DatasetFormat::Xlsx | DatasetFormat::Ris => None,
        }
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Input and output files span incompatible file families
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "Several file types were given ({}); all input files, as well as the output file, should be of the same type",
    .suffixes.join(", ")
)]
pub struct MixedFormatError {
    pub suffixes: Vec<String>,
}

/// Reject runs whose inputs and output belong to different file families.
///
/// Several distinct extensions are fine as long as all of them belong to the
/// same family (e.g. `.csv` inputs written to a `.tsv` output).
pub fn check_file_families(inputs: &[PathBuf], output: &Path) -> Result<(), MixedFormatError> {
    let suffixes: BTreeSet<String> = inputs
        .iter()
        .map(PathBuf::as_path)
        .chain(std::iter::once(output))
        .map(|p| extension(p).map(|e| format!(".{e}")).unwrap_or_default())
        .collect();

    if suffixes.len() <= 1 {
        return Ok(());
    }

    let families: Vec<Option<FileFamily>> = suffixes
        .iter()
        .map(|s| FileFamily::from_path(format!("x{s}")))
        .collect();

    let first = families[0];
    if first.is_some() && families.iter().all(|f| *f == first) {
        Ok(())
    } else {
        Err(MixedFormatError {
            suffixes: suffixes.into_iter().collect(),
        })
    }
}

/// Errors that can occur while loading or writing a dataset
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// The file extension is not one this crate reads or writes
    #[error("Unsupported file format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// A required semantic column has none of its accepted headers
    #[error("No '{field}' column found in {}", .path.display())]
    MissingColumn { field: &'static str, path: PathBuf },

    /// IO error (file system)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed delimited data
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Load a dataset and canonicalise its headers.
///
/// Headers matching a configured alias are renamed to the canonical field
/// name (`title`, `abstract`, `doi`, `included`), column roles are inferred
/// from the final headers, and a missing `title` or `abstract` column is an
/// error.
pub fn load(
    path: &Path,
    columns: &ColumnDefinitions,
    mother_id_column: &str,
) -> Result<Table, DatasetError> {
    let delimiter = DatasetFormat::from_path(path)
        .and_then(DatasetFormat::delimiter)
        .ok_or_else(|| DatasetError::UnsupportedFormat(path.to_path_buf()))?;

    let mut table = tabular::read(path, delimiter)?;

    let headers: Vec<String> = table.headers().iter().map(|h| h.to_string()).collect();
    for header in &headers {
        if let Some(field) = columns.resolve(header) {
            if !table.rename_column(header, field.name()) {
                tracing::debug!(
                    "Keeping header '{}' in {}: '{}' already present",
                    header,
                    path.display(),
                    field.name()
                );
            }
        }
    }

    for field in [Field::Title, Field::Abstract] {
        if !table.has_column(field.name()) {
            return Err(DatasetError::MissingColumn {
                field: field.name(),
                path: path.to_path_buf(),
            });
        }
    }

    let headers: Vec<String> = table.headers().iter().map(|h| h.to_string()).collect();
    for header in &headers {
        table.set_role(header, ColumnRole::infer(header, mother_id_column));
    }

    tracing::debug!(
        "Loaded {} records with {} columns from {}",
        table.len(),
        table.columns().len(),
        path.display()
    );
    Ok(table)
}

/// Write a dataset, preserving column order
pub fn write(table: &Table, path: &Path) -> Result<(), DatasetError> {
    let delimiter = DatasetFormat::from_path(path)
        .and_then(DatasetFormat::delimiter)
        .ok_or_else(|| DatasetError::UnsupportedFormat(path.to_path_buf()))?;

    tabular::write(table, path, delimiter)?;
    tracing::debug!("Wrote {} records to {}", table.len(), path.display());
    Ok(())
}
