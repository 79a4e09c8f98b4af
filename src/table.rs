// SPDX-License-Identifier: AGPL-3.0-only

//! Minimal delimited-table support.
//!
//! Just enough of a table to carry an experimental dataset through the
//! pipeline: a header row, string cells, column lookup/rename, and CSV
//! round-trip. Cells are kept as strings so columns the pipeline never
//! resolves pass through to the output untouched.
//!
//! Quoted fields are not supported; the experimental CSVs this consumes
//! are plain numeric tables.

use crate::error::ValidationError;
use std::path::Path;

/// An ordered table of named columns over string cells.
#[derive(Debug, Clone)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Create an empty table with the given column names.
    #[must_use]
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Parse a table from CSV text (comma-separated, header row required).
    ///
    /// Trims surrounding whitespace and carriage returns, skips blank lines.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DataLoad`] if the header is missing or a
    /// row's field count disagrees with the header.
    pub fn from_csv_str(text: &str) -> Result<Self, ValidationError> {
        let mut lines = text.lines().filter(|l| !l.trim().is_empty());
        let header = lines
            .next()
            .ok_or_else(|| ValidationError::DataLoad("CSV file has no header row".into()))?;
        let columns: Vec<String> = header
            .split(',')
            .map(|c| c.trim().trim_matches('\r').to_string())
            .collect();

        let mut rows = Vec::new();
        for (i, line) in lines.enumerate() {
            let cells: Vec<String> = line
                .split(',')
                .map(|c| c.trim().trim_matches('\r').to_string())
                .collect();
            if cells.len() != columns.len() {
                return Err(ValidationError::DataLoad(format!(
                    "CSV row {} has {} fields, expected {}",
                    i + 1,
                    cells.len(),
                    columns.len()
                )));
            }
            rows.push(cells);
        }

        Ok(Self { columns, rows })
    }

    /// Load a table from a CSV file on disk.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DataLoad`] if the file cannot be read or
    /// parsed.
    pub fn from_csv_path(path: &Path) -> Result<Self, ValidationError> {
        if !path.exists() {
            return Err(ValidationError::DataLoad(format!(
                "Experimental data file not found: {}",
                path.display()
            )));
        }
        let text = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::DataLoad(format!("read {}: {e}", path.display()))
        })?;
        Self::from_csv_str(&text)
    }

    /// Column names, in order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of data rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has zero data rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by exact name.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Whether a column with this exact name exists.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// All cells of a named column, in row order.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r[idx].as_str()).collect())
    }

    /// Cell at (row, column name).
    #[must_use]
    pub fn cell(&self, row: usize, name: &str) -> Option<&str> {
        let idx = self.column_index(name)?;
        self.rows.get(row).map(|r| r[idx].as_str())
    }

    /// Append a data row.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DataLoad`] on field-count mismatch.
    pub fn push_row(&mut self, cells: Vec<String>) -> Result<(), ValidationError> {
        if cells.len() != self.columns.len() {
            return Err(ValidationError::DataLoad(format!(
                "row has {} fields, expected {}",
                cells.len(),
                self.columns.len()
            )));
        }
        self.rows.push(cells);
        Ok(())
    }

    /// Rename a column in place. No-op if `from` is absent.
    pub fn rename_column(&mut self, from: &str, to: &str) {
        if let Some(idx) = self.column_index(from) {
            self.columns[idx] = to.to_string();
        }
    }

    /// Append a new column with one value per existing row.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DataLoad`] if `values` does not have
    /// exactly one entry per row.
    pub fn push_column(
        &mut self,
        name: &str,
        values: Vec<String>,
    ) -> Result<(), ValidationError> {
        if values.len() != self.rows.len() {
            return Err(ValidationError::DataLoad(format!(
                "column '{name}' has {} values, expected {}",
                values.len(),
                self.rows.len()
            )));
        }
        self.columns.push(name.to_string());
        for (row, v) in self.rows.iter_mut().zip(values) {
            row.push(v);
        }
        Ok(())
    }

    /// Project onto the given columns, keeping only those actually present,
    /// in the order given.
    #[must_use]
    pub fn select(&self, wanted: &[&str]) -> Self {
        let indices: Vec<usize> = wanted
            .iter()
            .filter_map(|name| self.column_index(name))
            .collect();
        let columns = indices.iter().map(|&i| self.columns[i].clone()).collect();
        let rows = self
            .rows
            .iter()
            .map(|r| indices.iter().map(|&i| r[i].clone()).collect())
            .collect();
        Self { columns, rows }
    }

    /// Keep only rows whose index satisfies the predicate.
    #[must_use]
    pub fn filter_rows(&self, keep: impl Fn(usize) -> bool) -> Self {
        let rows = self
            .rows
            .iter()
            .enumerate()
            .filter(|(i, _)| keep(*i))
            .map(|(_, r)| r.clone())
            .collect();
        Self {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Serialize as CSV (header row first, `\n` line endings).
    #[must_use]
    pub fn to_csv_string(&self) -> String {
        let mut out = self.columns.join(",");
        out.push('\n');
        for row in &self.rows {
            out.push_str(&row.join(","));
            out.push('\n');
        }
        out
    }

    /// Write the table as a CSV file.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DataLoad`] on IO failure.
    pub fn write_csv(&self, path: &Path) -> Result<(), ValidationError> {
        std::fs::write(path, self.to_csv_string()).map_err(|e| {
            ValidationError::DataLoad(format!("write {}: {e}", path.display()))
        })
    }
}
