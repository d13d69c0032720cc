use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, WriterBuilder};
use tempfile::NamedTempFile;
use tracing::debug;

use dcs_model::{CellValue, CsvOptions, Table};

use crate::error::{IngestError, Result};

fn normalize_header(raw: &str, position: usize) -> String {
    let trimmed = raw.trim().trim_matches('\u{feff}');
    let mut parts = trimmed.split_whitespace();
    let mut normalized = String::new();
    if let Some(first) = parts.next() {
        normalized.push_str(first);
        for part in parts {
            normalized.push(' ');
            normalized.push_str(part);
        }
    }
    if normalized.is_empty() {
        format!("unnamed_{position}")
    } else {
        normalized
    }
}

fn normalize_cell(raw: &str) -> CellValue {
    CellValue::from_raw(raw.trim().trim_matches('\u{feff}'))
}

/// Read a delimited text file with a header row into a [`Table`].
///
/// Short records are padded with missing cells, surplus cells are dropped,
/// and records that are entirely blank are skipped.
pub fn read_table(path: &Path, options: &CsvOptions) -> Result<Table> {
    let csv_error = |source: csv::Error| IngestError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(options.delimiter_for(path))
        .from_path(path)
        .map_err(csv_error)?;
    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .enumerate()
        .map(|(position, header)| normalize_header(header, position))
        .collect();
    let width = headers.len();
    let mut table = Table::new(headers).map_err(|source| IngestError::InvalidTable {
        path: path.to_path_buf(),
        source,
    })?;
    let mut skipped = 0usize;
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        let row: Vec<CellValue> = (0..width)
            .map(|idx| normalize_cell(record.get(idx).unwrap_or("")))
            .collect();
        if row.iter().all(CellValue::is_missing) {
            skipped += 1;
            continue;
        }
        table.push_row(row)?;
    }
    debug!(
        path = %path.display(),
        rows = table.height(),
        columns = table.width(),
        skipped_blank = skipped,
        "read table"
    );
    Ok(table)
}

fn temp_sibling(path: &Path) -> Result<NamedTempFile> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|source| IngestError::FileWrite {
        path: parent.to_path_buf(),
        source,
    })?;
    NamedTempFile::new_in(parent).map_err(|source| IngestError::FileWrite {
        path: path.to_path_buf(),
        source,
    })
}

fn persist(temp: NamedTempFile, path: &Path) -> Result<()> {
    temp.persist(path)
        .map_err(|err| IngestError::FileWrite {
            path: path.to_path_buf(),
            source: err.error,
        })
        .map(|_| ())
}

/// A fully written temporary file waiting to replace its destination.
///
/// Dropping it without calling [`StagedFile::commit`] deletes the
/// temporary file and leaves the destination untouched.
#[must_use]
#[derive(Debug)]
pub struct StagedFile {
    temp: NamedTempFile,
    path: PathBuf,
}

impl StagedFile {
    /// Destination the file is committed to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rename the temporary file over the destination.
    pub fn commit(self) -> Result<()> {
        persist(self.temp, &self.path)
    }
}

/// Write a table as delimited text into a [`StagedFile`] beside `path`.
pub fn stage_table(table: &Table, path: &Path, options: &CsvOptions) -> Result<StagedFile> {
    let temp = temp_sibling(path)?;
    {
        let csv_error = |source: csv::Error| IngestError::Csv {
            path: path.to_path_buf(),
            source,
        };
        let mut writer = WriterBuilder::new()
            .delimiter(options.delimiter_for(path))
            .from_writer(temp.as_file());
        writer.write_record(table.columns()).map_err(csv_error)?;
        for row in table.rows() {
            writer
                .write_record(row.iter().map(CellValue::display))
                .map_err(csv_error)?;
        }
        writer.flush().map_err(|source| IngestError::FileWrite {
            path: path.to_path_buf(),
            source,
        })?;
    }
    debug!(
        path = %path.display(),
        rows = table.height(),
        columns = table.width(),
        "staged table"
    );
    Ok(StagedFile {
        temp,
        path: path.to_path_buf(),
    })
}

/// Write UTF-8 text into a [`StagedFile`] beside `path`.
pub fn stage_text(path: &Path, contents: &str) -> Result<StagedFile> {
    let mut temp = temp_sibling(path)?;
    temp.write_all(contents.as_bytes())
        .and_then(|()| temp.flush())
        .map_err(|source| IngestError::FileWrite {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(StagedFile {
        temp,
        path: path.to_path_buf(),
    })
}

/// Write a table as delimited text, without a row-index column.
///
/// Data is written to a temporary file beside `path` and renamed into
/// place, so a failed export never leaves a truncated file.
pub fn write_table(table: &Table, path: &Path, options: &CsvOptions) -> Result<()> {
    stage_table(table, path, options)?.commit()
}

/// Write UTF-8 text with the same replace-on-success behaviour as [`write_table`].
pub fn write_text(path: &Path, contents: &str) -> Result<()> {
    stage_text(path, contents)?.commit()
}
