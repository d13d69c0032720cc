//! In-memory tabular dataset.
//!
//! A [`Table`] is an ordered list of uniquely named columns plus rows of
//! [`CellValue`]s. Every row carries a stable index label that survives
//! filtering and sorting, so a row can still be addressed by its original
//! position after the table has been reshaped.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TableError};
use crate::types::{ColumnType, infer_column_type};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum CellValue {
    Text(String),
    Missing,
}

impl CellValue {
    /// Build a cell from raw text, treating blank text as missing.
    pub fn from_raw(raw: &str) -> Self {
        if raw.trim().is_empty() {
            Self::Missing
        } else {
            Self::Text(raw.to_string())
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            Self::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Text used when the cell is written out; missing cells render empty.
    pub fn display(&self) -> &str {
        self.as_text().unwrap_or("")
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::from_raw(value)
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        if value.trim().is_empty() {
            Self::Missing
        } else {
            Self::Text(value)
        }
    }
}

impl From<Option<&str>> for CellValue {
    fn from(value: Option<&str>) -> Self {
        value.map_or(Self::Missing, Self::from_raw)
    }
}

/// Composite value of a row over a set of key columns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowKey(Vec<CellValue>);

impl RowKey {
    pub fn new(values: Vec<CellValue>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[CellValue] {
        &self.0
    }

    /// True when every component is missing.
    pub fn is_blank(&self) -> bool {
        self.0.iter().all(CellValue::is_missing)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
    index: Vec<u64>,
    next_label: u64,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Result<Self> {
        let mut seen = BTreeSet::new();
        for name in &columns {
            if !seen.insert(name.as_str()) {
                return Err(TableError::DuplicateColumn(name.clone()));
            }
        }
        Ok(Self {
            columns,
            rows: Vec::new(),
            index: Vec::new(),
            next_label: 0,
        })
    }

    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Result<Self> {
        let mut table = Self::new(columns)?;
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Convenience constructor from string literals; blank strings are missing.
    pub fn from_strings(columns: &[&str], rows: &[&[&str]]) -> Result<Self> {
        let columns = columns.iter().map(|name| (*name).to_string()).collect();
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|value| CellValue::from_raw(value)).collect())
            .collect();
        Self::from_rows(columns, rows)
    }

    /// A table with the same columns and no rows.
    pub fn empty_like(&self) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: Vec::new(),
            index: Vec::new(),
            next_label: 0,
        }
    }

    pub fn push_row(&mut self, row: Vec<CellValue>) -> Result<()> {
        let label = self.next_label;
        self.push_row_labelled(row, label)
    }

    /// Push a row with an explicit index label.
    pub fn push_row_labelled(&mut self, row: Vec<CellValue>, label: u64) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(TableError::RowWidth {
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        self.index.push(label);
        self.next_label = self.next_label.max(label.saturating_add(1));
        Ok(())
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Resolve column names to positions, reporting every name that is absent.
    pub fn resolve_columns<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<usize>> {
        let mut positions = Vec::with_capacity(names.len());
        let mut missing = Vec::new();
        for name in names {
            match self.column_index(name.as_ref()) {
                Some(idx) => positions.push(idx),
                None => missing.push(name.as_ref().to_string()),
            }
        }
        if missing.is_empty() {
            Ok(positions)
        } else {
            Err(TableError::MissingColumns { columns: missing })
        }
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn row(&self, idx: usize) -> &[CellValue] {
        &self.rows[idx]
    }

    /// Row index labels, parallel to [`Table::rows`].
    pub fn index(&self) -> &[u64] {
        &self.index
    }

    pub fn label(&self, idx: usize) -> u64 {
        self.index[idx]
    }

    pub fn cell(&self, row: usize, column: usize) -> &CellValue {
        &self.rows[row][column]
    }

    pub fn value(&self, row: usize, name: &str) -> Option<&CellValue> {
        let column = self.column_index(name)?;
        self.rows.get(row).map(|cells| &cells[column])
    }

    pub fn set_cell(&mut self, row: usize, column: usize, value: CellValue) {
        self.rows[row][column] = value;
    }

    pub fn key(&self, row: usize, columns: &[usize]) -> RowKey {
        RowKey::new(
            columns
                .iter()
                .map(|&column| self.rows[row][column].clone())
                .collect(),
        )
    }

    pub fn column_values(&self, column: usize) -> impl Iterator<Item = &CellValue> {
        self.rows.iter().map(move |row| &row[column])
    }

    /// Infer the dtype of a column from its values.
    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        let column = self.column_index(name)?;
        Some(infer_column_type(self.column_values(column)))
    }

    /// New table holding the given rows in the given order, labels preserved.
    pub fn take(&self, indices: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: indices.iter().map(|&idx| self.rows[idx].clone()).collect(),
            index: indices.iter().map(|&idx| self.index[idx]).collect(),
            next_label: self.next_label,
        }
    }

    /// New table holding the rows whose mask entry is true.
    pub fn filter(&self, mask: &[bool]) -> Self {
        let indices: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter_map(|(idx, keep)| keep.then_some(idx))
            .collect();
        self.take(&indices)
    }

    pub fn add_column(&mut self, name: &str, values: Vec<CellValue>) -> Result<()> {
        if self.has_column(name) {
            return Err(TableError::DuplicateColumn(name.to_string()));
        }
        if values.len() != self.rows.len() {
            return Err(TableError::RowWidth {
                expected: self.rows.len(),
                found: values.len(),
            });
        }
        self.columns.push(name.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
        Ok(())
    }

    /// Position of `name`, appending an all-missing column first when absent.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column_index(name) {
            return idx;
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(CellValue::Missing);
        }
        self.columns.len() - 1
    }

    /// Remove a column, returning its values when it existed.
    pub fn drop_column(&mut self, name: &str) -> Option<Vec<CellValue>> {
        let column = self.column_index(name)?;
        self.columns.remove(column);
        Some(self.rows.iter_mut().map(|row| row.remove(column)).collect())
    }

    /// New table restricted to `names`, in that order.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Self> {
        let positions = self.resolve_columns(names)?;
        let columns: Vec<String> = names.iter().map(|name| name.as_ref().to_string()).collect();
        let mut seen = BTreeSet::new();
        for name in &columns {
            if !seen.insert(name.as_str()) {
                return Err(TableError::DuplicateColumn(name.clone()));
            }
        }
        Ok(Self {
            columns,
            rows: self
                .rows
                .iter()
                .map(|row| positions.iter().map(|&idx| row[idx].clone()).collect())
                .collect(),
            index: self.index.clone(),
            next_label: self.next_label,
        })
    }

    /// Append every row of `other`, aligning by column name.
    ///
    /// Columns only `other` has are added at the end; cells a row has no
    /// column for become missing. Appended rows get fresh labels.
    pub fn append(&mut self, other: &Self) {
        let positions: Vec<usize> = other
            .columns
            .iter()
            .map(|name| self.ensure_column(name))
            .collect();
        let width = self.columns.len();
        for source in &other.rows {
            let mut row = vec![CellValue::Missing; width];
            for (value, &target) in source.iter().zip(&positions) {
                row[target] = value.clone();
            }
            self.rows.push(row);
            self.index.push(self.next_label);
            self.next_label += 1;
        }
    }
}
