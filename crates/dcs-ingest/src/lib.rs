//! Table reader/writer for the merge-purge engine.
//!
//! - **csv_table**: delimited text to [`Table`](dcs_model::Table) and back, with
//!   whole-file atomic replacement on write
//! - **frame**: typed Polars `DataFrame` previews for the presentation layer

pub mod csv_table;
pub mod error;
pub mod frame;

pub use csv_table::{StagedFile, read_table, stage_table, stage_text, write_table, write_text};
pub use error::{IngestError, Result};
pub use frame::{frame_from_table, preview_frame};
