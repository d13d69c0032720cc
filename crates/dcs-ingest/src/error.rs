//! Error types for table ingestion and export.

use std::path::PathBuf;
use thiserror::Error;

use dcs_model::TableError;

/// Errors that can occur while reading or writing tables.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create or write an output file.
    #[error("failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Delimited text could not be parsed or written.
    #[error("csv error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The rows read do not form a valid table.
    #[error("invalid table in {path}: {source}")]
    InvalidTable {
        path: PathBuf,
        #[source]
        source: TableError,
    },

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Polars(#[from] polars::prelude::PolarsError),
}

pub type Result<T> = std::result::Result<T, IngestError>;
