pub mod error;
pub mod jobs;
pub mod options;
pub mod report;
pub mod specs;
pub mod table;
pub mod types;

pub use error::{Result, TableError};
pub use jobs::{MergeEntry, MergePurgeJob, SplitJob, SuppressEntry};
pub use options::CsvOptions;
pub use report::{ExecutionReport, SourceDelta};
pub use specs::{FieldMap, GatherOptions, SortKey, SortSpec, SplitSpec, reconcile_flags};
pub use table::{CellValue, RowKey, Table};
pub use types::{ColumnType, infer_column_type, parse_timestamp};
