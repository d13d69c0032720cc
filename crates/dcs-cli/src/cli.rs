//! CLI argument definitions for the data cleaning studio.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use dcs_cli::config::parse_field_map_entry;

#[derive(Parser)]
#[command(
    name = "dcs",
    version,
    about = "Data Cleaning Studio - merge, purge, dedupe and split tabular files",
    long_about = "Run the data cleaning studio batch operations without the desktop shell.\n\n\
                  Every operation reads and writes delimited text. Merge-purge and split\n\
                  runs can be described in a TOML job file; flags override job values."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Merge sources into a primary file, suppress matches, sort, dedupe and export.
    MergePurge(MergePurgeArgs),

    /// Split a file into kept and superseded duplicates.
    Dedupe(DedupeArgs),

    /// Assign or repair a numeric id column over a key.
    AssignIds(AssignIdsArgs),

    /// Overlay fields from a source file onto a target file.
    Gather(GatherArgs),

    /// Export a file as many files, one per combination of split values.
    Split(SplitArgs),
}

#[derive(Args, Clone, Copy, Default)]
pub struct CsvArgs {
    /// Field delimiter (default: tab for .tsv/.tab, comma otherwise).
    #[arg(long = "delimiter", value_name = "CHAR")]
    pub delimiter: Option<char>,
}

#[derive(Args)]
pub struct MergePurgeArgs {
    /// TOML job file describing the run.
    #[arg(long = "job", value_name = "PATH")]
    pub job: Option<PathBuf>,

    /// Primary input file.
    #[arg(long = "primary", value_name = "PATH")]
    pub primary: Option<PathBuf>,

    /// Destination file; the report is written beside it.
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// File whose rows are appended to the primary (repeatable).
    #[arg(long = "merge", value_name = "PATH")]
    pub merge: Vec<PathBuf>,

    /// File whose keys remove matching rows (repeatable).
    #[arg(long = "suppress", value_name = "PATH")]
    pub suppress: Vec<PathBuf>,

    /// Suppression-to-primary column mapping for every --suppress file.
    #[arg(long = "field-map", value_name = "FROM=TO", value_parser = parse_field_map_entry)]
    pub field_map: Vec<(String, String)>,

    /// Columns whose combined values identify a duplicate.
    #[arg(long = "dedupe-on", value_name = "COLUMNS", value_delimiter = ',')]
    pub dedupe_on: Vec<String>,

    /// Columns to sort by before deduplication.
    #[arg(long = "sort", value_name = "COLUMNS", value_delimiter = ',')]
    pub sort: Vec<String>,

    /// Direction per sort column (missing entries sort descending).
    #[arg(long = "ascending", value_name = "BOOLS", value_delimiter = ',')]
    pub ascending: Vec<bool>,

    /// How the report is printed.
    #[arg(long = "report-format", value_enum, default_value = "text")]
    pub report_format: ReportFormatArg,

    /// Run every phase and print the report without writing files.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Print the first N result rows after the text summary.
    #[arg(long = "preview", value_name = "N")]
    pub preview: Option<usize>,

    #[command(flatten)]
    pub csv: CsvArgs,
}

#[derive(Args)]
pub struct DedupeArgs {
    /// Input file.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Columns whose combined values identify a record.
    #[arg(long = "key", value_name = "COLUMNS", value_delimiter = ',', required = true)]
    pub key: Vec<String>,

    /// Id column to assign or repair.
    #[arg(long = "id-column", value_name = "NAME", default_value = "id")]
    pub id_column: String,

    /// Tie-break columns; the last row in this order is kept.
    #[arg(long = "sort", value_name = "COLUMNS", value_delimiter = ',')]
    pub sort: Vec<String>,

    /// Pre-sort direction per column (default: all ascending).
    #[arg(long = "ascending", value_name = "BOOLS", value_delimiter = ',')]
    pub ascending: Option<Vec<bool>>,

    /// Kept rows (default: <INPUT stem>_kept.<ext>).
    #[arg(long = "kept", value_name = "PATH")]
    pub kept: Option<PathBuf>,

    /// Superseded rows (default: <INPUT stem>_superseded.<ext>).
    #[arg(long = "superseded", value_name = "PATH")]
    pub superseded: Option<PathBuf>,

    #[command(flatten)]
    pub csv: CsvArgs,
}

#[derive(Args)]
pub struct AssignIdsArgs {
    /// Input file.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Columns whose combined values identify a record.
    #[arg(long = "key", value_name = "COLUMNS", value_delimiter = ',', required = true)]
    pub key: Vec<String>,

    /// Id column to assign or repair.
    #[arg(long = "id-column", value_name = "NAME", default_value = "id")]
    pub id_column: String,

    /// First id issued when the id column does not exist yet.
    #[arg(long = "start", value_name = "N", default_value_t = 1)]
    pub start: i64,

    /// Output file (default: <INPUT stem>_ids.<ext>).
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub csv: CsvArgs,
}

#[derive(Args)]
pub struct GatherArgs {
    /// File receiving the fields.
    #[arg(value_name = "TARGET")]
    pub target: PathBuf,

    /// File supplying the fields.
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// Key column shared by both files (default: row position).
    #[arg(long = "on", value_name = "COLUMN")]
    pub on: Option<String>,

    /// Source columns to overlay (default: all).
    #[arg(long = "fields", value_name = "COLUMNS", value_delimiter = ',')]
    pub fields: Option<Vec<String>>,

    /// Do not append source rows missing from the target.
    #[arg(long = "no-append")]
    pub no_append: bool,

    /// Output file.
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: PathBuf,

    #[command(flatten)]
    pub csv: CsvArgs,
}

#[derive(Args)]
pub struct SplitArgs {
    /// TOML job file describing the split.
    #[arg(long = "job", value_name = "PATH")]
    pub job: Option<PathBuf>,

    /// Input file.
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// Columns whose value combinations name the output files.
    #[arg(long = "split-on", value_name = "COLUMNS", value_delimiter = ',')]
    pub split_on: Vec<String>,

    /// Columns written to every output file (default: all).
    #[arg(long = "fields", value_name = "COLUMNS", value_delimiter = ',')]
    pub fields: Option<Vec<String>>,

    /// Drop rows with a missing split value instead of writing them as "blank".
    #[arg(long = "dropna")]
    pub dropna: bool,

    /// Output directory (default: the input file's directory).
    #[arg(long = "dest-dir", value_name = "DIR")]
    pub dest_dir: Option<PathBuf>,

    /// Maximum rows per output file.
    #[arg(long = "chunk-size", value_name = "ROWS")]
    pub chunk_size: Option<usize>,

    #[command(flatten)]
    pub csv: CsvArgs,
}

/// Report output choices.
#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormatArg {
    Text,
    Json,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
