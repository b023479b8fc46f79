//! In-memory tabular dataset with column-name-indexed access.

use serde::{Deserialize, Serialize};

use crate::io::DatasetFormat;

/// Prefix of the per-source inclusion label columns (`included_<file>`)
pub const LABEL_PREFIX: &str = "included_";

/// A single cell; `None` means the value is absent
pub type Cell = Option<String>;

/// What a column means to the merge engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    /// Ordinary bibliographic data (title, abstract, doi, ...)
    Data,
    /// Whether a given input file contained the record (`"1"` / `"0"`)
    SourcePresence,
    /// The inclusion decision a given input file recorded
    InclusionLabel,
    /// The pipeline-assigned mother identifier
    MotherId,
}

impl ColumnRole {
    /// Infer the role of a column from its header.
    ///
    /// Headers that are themselves names of readable dataset files (`a.csv`,
    /// `b.tsv`) are presence columns of a previously merged file, `included_*`
    /// headers are labels.
    pub fn infer(name: &str, mother_id_column: &str) -> Self {
        if name == mother_id_column {
            ColumnRole::MotherId
        } else if name.starts_with(LABEL_PREFIX) {
            ColumnRole::InclusionLabel
        } else if DatasetFormat::from_path(name).is_some_and(DatasetFormat::is_readable) {
            ColumnRole::SourcePresence
        } else {
            ColumnRole::Data
        }
    }

    /// Source-attribution columns are folded onto surviving records
    pub fn is_attribution(self) -> bool {
        matches!(self, ColumnRole::SourcePresence | ColumnRole::InclusionLabel)
    }
}

/// Column header plus role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub role: ColumnRole,
}

impl Column {
    pub fn new(name: impl Into<String>, role: ColumnRole) -> Self {
        Self {
            name: name.into(),
            role,
        }
    }

    pub fn data(name: impl Into<String>) -> Self {
        Self::new(name, ColumnRole::Data)
    }
}

/// An ordered set of records sharing one column set.
///
/// Every mutation bumps [`Table::version`], so callers holding indices can
/// tell whether the table changed underneath them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<Cell>>,
    version: u64,
}

impl Table {
    /// Create an empty table with the given columns
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            version: 0,
        }
    }

    /// Create an empty table of data columns
    pub fn with_headers<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(headers.into_iter().map(Column::data).collect())
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Mutation counter
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column headers in order
    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn role_of(&self, name: &str) -> Option<ColumnRole> {
        self.columns.iter().find(|c| c.name == name).map(|c| c.role)
    }

    /// Names of all columns with the given role, in column order
    pub fn columns_with_role(&self, role: ColumnRole) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.role == role)
            .map(|c| c.name.clone())
            .collect()
    }

    /// Names of all source-attribution columns, in column order
    pub fn attribution_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.role.is_attribution())
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[Cell]> {
        self.rows.get(index).map(|r| r.as_slice())
    }

    /// Cell value by row index and column name
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.column_index(column)?;
        self.get_at(row, col)
    }

    /// Cell value by row and column index
    pub fn get_at(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col)?.as_deref()
    }

    /// All values of one column; `None` if the column does not exist
    pub fn column_values(&self, column: &str) -> Option<Vec<Option<&str>>> {
        let col = self.column_index(column)?;
        Some(self.rows.iter().map(|r| r[col].as_deref()).collect())
    }

    /// Append a row, padding or truncating it to the column count
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), None);
        self.rows.push(row);
        self.version += 1;
    }

    /// Overwrite a cell. Returns `false` if the row or column does not exist.
    pub fn set(&mut self, row: usize, column: &str, value: Cell) -> bool {
        match self.column_index(column) {
            Some(col) => self.set_at(row, col, value),
            None => false,
        }
    }

    /// Overwrite a cell by index. Returns `false` if out of bounds.
    pub fn set_at(&mut self, row: usize, col: usize, value: Cell) -> bool {
        match self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            Some(cell) => {
                *cell = value;
                self.version += 1;
                true
            }
            None => false,
        }
    }

    /// Append a column filled with `fill`. An existing column of the same
    /// name is left in place and only has its role updated.
    pub fn add_column(&mut self, name: impl Into<String>, role: ColumnRole, fill: Cell) {
        let name = name.into();
        let position = self.columns.len();
        self.insert_column(position, name, role, fill);
    }

    /// Insert a column at `position` (clamped to the column count)
    pub fn insert_column(
        &mut self,
        position: usize,
        name: impl Into<String>,
        role: ColumnRole,
        fill: Cell,
    ) {
        let name = name.into();
        if let Some(existing) = self.columns.iter_mut().find(|c| c.name == name) {
            existing.role = role;
            self.version += 1;
            return;
        }

        let position = position.min(self.columns.len());
        self.columns.insert(position, Column::new(name, role));
        for row in &mut self.rows {
            row.insert(position, fill.clone());
        }
        self.version += 1;
    }

    /// Rename a column. Returns `false` if `from` is missing or `to` exists.
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        if from == to {
            return self.has_column(from);
        }
        if self.has_column(to) {
            return false;
        }
        match self.columns.iter_mut().find(|c| c.name == from) {
            Some(column) => {
                column.name = to.to_string();
                self.version += 1;
                true
            }
            None => false,
        }
    }

    pub fn set_role(&mut self, column: &str, role: ColumnRole) -> bool {
        match self.columns.iter_mut().find(|c| c.name == column) {
            Some(c) => {
                c.role = role;
                self.version += 1;
                true
            }
            None => false,
        }
    }

    /// Drop every column matching the predicate
    pub fn drop_columns<F>(&mut self, mut predicate: F) -> Vec<String>
    where
        F: FnMut(&Column) -> bool,
    {
        let keep: Vec<bool> = self.columns.iter().map(|c| !predicate(c)).collect();
        if keep.iter().all(|k| *k) {
            return Vec::new();
        }

        let dropped = self
            .columns
            .iter()
            .zip(&keep)
            .filter(|(_, k)| !**k)
            .map(|(c, _)| c.name.clone())
            .collect();

        self.columns = select(std::mem::take(&mut self.columns), &keep);
        for row in &mut self.rows {
            *row = select(std::mem::take(row), &keep);
        }
        self.version += 1;
        dropped
    }

    /// Reorder columns by a permutation of column indices
    pub fn reorder_columns(&mut self, order: &[usize]) {
        debug_assert_eq!(order.len(), self.columns.len());
        let columns = order.iter().map(|&i| self.columns[i].clone()).collect();
        self.columns = columns;
        for row in &mut self.rows {
            *row = order.iter().map(|&i| row[i].clone()).collect();
        }
        self.version += 1;
    }

    /// Keep rows whose mask entry is `true`, preserving order
    pub fn retain_rows(&mut self, mask: &[bool]) {
        debug_assert_eq!(mask.len(), self.rows.len());
        self.rows = select(std::mem::take(&mut self.rows), mask);
        self.version += 1;
    }

    /// A new table with the same columns and the rows at `indices`
    pub fn select_rows(&self, indices: &[usize]) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
            version: 0,
        }
    }

    /// Stack tables vertically.
    ///
    /// The result has the union of all columns in first-seen order; cells
    /// of columns a table does not have are absent.
    pub fn vstack(tables: Vec<Table>) -> Table {
        let mut columns: Vec<Column> = Vec::new();
        for table in &tables {
            for column in &table.columns {
                if !columns.iter().any(|c| c.name == column.name) {
                    columns.push(column.clone());
                }
            }
        }

        let mut stacked = Table::new(columns);
        for table in tables {
            let mapping: Vec<Option<usize>> = stacked
                .columns
                .iter()
                .map(|c| table.column_index(&c.name))
                .collect();
            for row in table.rows {
                let cells = mapping
                    .iter()
                    .map(|m| m.and_then(|i| row[i].clone()))
                    .collect();
                stacked.rows.push(cells);
            }
        }
        stacked.version = 0;
        stacked
    }
}

fn select<T>(items: Vec<T>, keep: &[bool]) -> Vec<T> {
    items
        .into_iter()
        .zip(keep)
        .filter(|(_, k)| **k)
        .map(|(item, _)| item)
        .collect()
}
