use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("duplicate column name: {0}")]
    DuplicateColumn(String),
    #[error("row has {found} cells but the table has {expected} columns")]
    RowWidth { expected: usize, found: usize },
    #[error("missing columns: {}", .columns.join(", "))]
    MissingColumns { columns: Vec<String> },
}

pub type Result<T> = std::result::Result<T, TableError>;
