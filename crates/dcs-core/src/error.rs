use std::path::PathBuf;

use thiserror::Error;

use dcs_ingest::IngestError;
use dcs_model::TableError;

#[derive(Debug, Error)]
pub enum CoreError {
    /// Assigned ids are not one-to-one with keys; pre-existing ids were duplicated.
    #[error(
        "id integrity violated for '{id_column}': {distinct_ids} distinct ids for {distinct_keys} distinct keys"
    )]
    IdIntegrity {
        id_column: String,
        distinct_ids: usize,
        distinct_keys: usize,
    },

    #[error("suppression source {} is missing key columns: {}", .path.display(), .columns.join(", "))]
    MissingKey { path: PathBuf, columns: Vec<String> },

    #[error(
        "suppression source {} has no key columns: supply a field map or dedupe-on columns",
        .path.display()
    )]
    NoSuppressionKey { path: PathBuf },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Ingest(#[from] IngestError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
