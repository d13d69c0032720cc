//! Merge-purge and deduplication engine.
//!
//! - **ids**: surrogate id assignment over a uniqueness key
//! - **ordering**: stable multi-column sort and first-wins deduplication
//! - **partition**: split a table into kept and superseded duplicates
//! - **gather**: overlay fields from one table onto another by key
//! - **merge_purge**: merge, suppress, sort, dedupe and export in one pass
//! - **split**: export a table as many files keyed by split columns

pub mod error;
pub mod gather;
pub mod ids;
pub mod merge_purge;
pub mod ordering;
pub mod partition;
pub mod split;

pub use error::{CoreError, Result};
pub use gather::gather_fields;
pub use ids::assign_ids;
pub use merge_purge::{
    AUDIT_COLUMN, ExportPaths, MergePurgeOutcome, MergePurgeRequest, MergeSource,
    SuppressionSource, execute, report_path, run,
};
pub use ordering::{dedupe_first_wins, sort_order, sort_table};
pub use partition::{Partition, partition_duplicates};
pub use split::{BLANK_TOKEN, split_to_files};
