use std::path::PathBuf;

use polars::prelude::DataFrame;

use dcs_core::ExportPaths;
use dcs_model::ExecutionReport;

use crate::cli::ReportFormatArg;

/// Outcome of the merge-purge subcommand.
pub struct MergePurgeResult {
    pub report: ExecutionReport,
    /// `None` for a dry run.
    pub exported: Option<ExportPaths>,
    pub report_format: ReportFormatArg,
    /// Leading result rows, when `--preview` was given.
    pub preview: Option<DataFrame>,
}

/// One file written by a subcommand.
pub struct WrittenFile {
    pub role: &'static str,
    pub path: PathBuf,
    /// Row count when the command knows it without re-reading the file.
    pub rows: Option<usize>,
}

/// Outcome of the single-input subcommands.
pub struct OperationResult {
    pub operation: &'static str,
    pub input: PathBuf,
    pub input_rows: usize,
    pub files: Vec<WrittenFile>,
}
