//! Delimited text (CSV / TSV) reading and writing.

use csv::{ReaderBuilder, WriterBuilder};
use std::path::Path;

use super::DatasetError;
use crate::models::Table;

/// Read a delimited file. Empty cells become absent values.
pub(super) fn read(path: &Path, delimiter: u8) -> Result<Table, DatasetError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)?;

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    let mut table = Table::with_headers(headers);

    for record in reader.records() {
        let record = record?;
        let cells = record
            .iter()
            .map(|value| {
                if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                }
            })
            .collect();
        table.push_row(cells);
    }

    Ok(table)
}

/// Write a delimited file. Absent values are written as empty cells.
pub(super) fn write(table: &Table, path: &Path, delimiter: u8) -> Result<(), DatasetError> {
    let mut writer = WriterBuilder::new().delimiter(delimiter).from_path(path)?;

    writer.write_record(table.headers())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
    }

    writer.flush()?;
    Ok(())
}
