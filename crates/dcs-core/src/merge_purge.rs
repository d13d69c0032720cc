//! Merge-purge orchestration.
//!
//! One run appends every merge source to the primary table, removes the
//! rows matched by each suppression source, sorts, drops duplicates of the
//! dedupe key and, for [`run`], exports the result and its report. The
//! phases are sequential and nothing is written until all of them succeed.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, info_span, warn};

use dcs_ingest::{read_table, stage_table, stage_text};
use dcs_model::{
    CellValue, CsvOptions, ExecutionReport, FieldMap, MergePurgeJob, SortSpec, SourceDelta, Table,
};

use crate::error::{CoreError, Result};
use crate::ordering::{first_wins, sort_table};

/// Audit column tagging every row with its position in the merged input.
pub const AUDIT_COLUMN: &str = "__dcs_row__";

#[derive(Debug, Clone)]
pub struct MergeSource {
    pub path: PathBuf,
    pub table: Table,
}

impl MergeSource {
    pub fn new(path: impl Into<PathBuf>, table: Table) -> Self {
        Self {
            path: path.into(),
            table,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SuppressionSource {
    pub path: PathBuf,
    pub table: Table,
    /// Suppression column to primary column; the dedupe key is used when unset.
    pub field_map: Option<FieldMap>,
}

impl SuppressionSource {
    pub fn new(path: impl Into<PathBuf>, table: Table) -> Self {
        Self {
            path: path.into(),
            table,
            field_map: None,
        }
    }

    #[must_use]
    pub fn with_field_map(mut self, field_map: FieldMap) -> Self {
        self.field_map = Some(field_map);
        self
    }
}

/// Everything one merge-purge run needs, already loaded into memory.
#[derive(Debug, Clone)]
pub struct MergePurgeRequest {
    pub primary_path: PathBuf,
    pub primary: Table,
    pub merges: Vec<MergeSource>,
    pub suppressions: Vec<SuppressionSource>,
    pub sort: SortSpec,
    pub dedupe_on: Vec<String>,
}

impl MergePurgeRequest {
    pub fn new(primary_path: impl Into<PathBuf>, primary: Table) -> Self {
        Self {
            primary_path: primary_path.into(),
            primary,
            merges: Vec::new(),
            suppressions: Vec::new(),
            sort: SortSpec::default(),
            dedupe_on: Vec::new(),
        }
    }

    /// Read the primary table and every source named by `job`.
    pub fn from_job(job: &MergePurgeJob) -> Result<Self> {
        let mut request = Self::new(&job.primary, read_table(&job.primary, &job.csv)?)
            .with_sort(job.sort.clone())
            .with_dedupe_on(job.dedupe_on.clone());
        for entry in &job.merge {
            let table = read_table(&entry.path, &job.csv)?;
            request = request.with_merge(MergeSource::new(&entry.path, table));
        }
        for entry in &job.suppress {
            let table = read_table(&entry.path, &job.csv)?;
            let mut source = SuppressionSource::new(&entry.path, table);
            source.field_map = entry.field_map.clone();
            request = request.with_suppression(source);
        }
        Ok(request)
    }

    #[must_use]
    pub fn with_merge(mut self, source: MergeSource) -> Self {
        self.merges.push(source);
        self
    }

    #[must_use]
    pub fn with_suppression(mut self, source: SuppressionSource) -> Self {
        self.suppressions.push(source);
        self
    }

    #[must_use]
    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = sort;
        self
    }

    #[must_use]
    pub fn with_dedupe_on(mut self, dedupe_on: Vec<String>) -> Self {
        self.dedupe_on = dedupe_on;
        self
    }
}

#[derive(Debug, Clone)]
pub struct MergePurgeOutcome {
    pub table: Table,
    pub report: ExecutionReport,
}

impl MergePurgeOutcome {
    pub fn report_text(&self) -> String {
        self.report.render()
    }
}

/// Files written by [`run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    pub table: PathBuf,
    pub report: PathBuf,
}

/// `{stem}_report.txt` beside `destination`.
pub fn report_path(destination: &Path) -> PathBuf {
    let stem = destination
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    destination.with_file_name(format!("{stem}_report.txt"))
}

/// Run every phase in memory and return the result with its report.
pub fn execute(request: &MergePurgeRequest) -> Result<MergePurgeOutcome> {
    let span = info_span!("merge_purge", primary = %request.primary_path.display());
    let _guard = span.enter();
    build(request, None)
}

/// Run every phase, then write the result to `destination` and the report beside it.
///
/// Both files are staged before either replaces its destination. When the
/// report cannot be committed the freshly committed table is removed again.
pub fn run(
    request: &MergePurgeRequest,
    destination: &Path,
    csv: &CsvOptions,
) -> Result<(MergePurgeOutcome, ExportPaths)> {
    let span = info_span!("merge_purge", primary = %request.primary_path.display());
    let _guard = span.enter();
    let outcome = build(request, Some(destination))?;
    let paths = ExportPaths {
        table: destination.to_path_buf(),
        report: report_path(destination),
    };
    let table = stage_table(&outcome.table, &paths.table, csv)?;
    let report = stage_text(&paths.report, &outcome.report_text())?;
    table.commit()?;
    if let Err(error) = report.commit() {
        if let Err(cleanup) = fs::remove_file(&paths.table) {
            warn!(path = %paths.table.display(), error = %cleanup, "could not remove export");
        }
        return Err(error.into());
    }
    info!(
        rows = outcome.table.height(),
        path = %paths.table.display(),
        report = %paths.report.display(),
        "exported"
    );
    Ok((outcome, paths))
}

fn build(request: &MergePurgeRequest, destination: Option<&Path>) -> Result<MergePurgeOutcome> {
    reject_audit_column(&request.primary_path, &request.primary)?;
    for source in &request.merges {
        reject_audit_column(&source.path, &source.table)?;
    }

    let original_rows = request.primary.height();
    let mut next_tag = 0u64;
    let mut result = tagged(&request.primary, &mut next_tag)?;

    let mut merges = Vec::with_capacity(request.merges.len());
    for source in &request.merges {
        result.append(&tagged(&source.table, &mut next_tag)?);
        debug!(source = %source.path.display(), rows = source.table.height(), "merged source");
        merges.push(SourceDelta::new(&source.path, source.table.height()));
    }
    info!(
        rows = result.height(),
        gained = merges.iter().map(|delta| delta.rows).sum::<usize>(),
        "merged"
    );

    let mut suppressions = Vec::with_capacity(request.suppressions.len());
    for source in &request.suppressions {
        let before = result.height();
        result = suppress(&result, source, &request.dedupe_on)?;
        let lost = before - result.height();
        debug!(source = %source.path.display(), lost, "suppressed source");
        suppressions.push(SourceDelta::new(&source.path, lost));
    }
    info!(
        rows = result.height(),
        lost = suppressions.iter().map(|delta| delta.rows).sum::<usize>(),
        "suppressed"
    );

    let sort = request.sort.reconciled();
    result = sort_table(&result, &sort)?;
    info!(rows = result.height(), columns = ?sort.columns, "sorted");

    let mut dedupe_lost = 0;
    if !request.dedupe_on.is_empty() {
        let positions = result.resolve_columns(&request.dedupe_on)?;
        let (kept, repeated) = first_wins(&result, &positions);
        dedupe_lost = repeated.len();
        result = result.take(&kept);
    }
    info!(rows = result.height(), lost = dedupe_lost, "deduplicated");

    result.drop_column(AUDIT_COLUMN);
    let report = ExecutionReport {
        primary: request.primary_path.clone(),
        destination: destination.map(Path::to_path_buf),
        original_rows,
        final_rows: result.height(),
        merges,
        suppressions,
        sort,
        dedupe_on: request.dedupe_on.clone(),
        dedupe_lost,
    };
    Ok(MergePurgeOutcome {
        table: result,
        report,
    })
}

fn reject_audit_column(path: &Path, table: &Table) -> Result<()> {
    if table.has_column(AUDIT_COLUMN) {
        return Err(CoreError::InvalidArgument(format!(
            "{} already has a column named {AUDIT_COLUMN}",
            path.display()
        )));
    }
    Ok(())
}

fn tagged(table: &Table, next_tag: &mut u64) -> Result<Table> {
    let tags: Vec<CellValue> = (0..table.height())
        .map(|_| {
            let tag = CellValue::Text(next_tag.to_string());
            *next_tag += 1;
            tag
        })
        .collect();
    let mut tagged = table.clone();
    tagged.add_column(AUDIT_COLUMN, tags)?;
    Ok(tagged)
}

/// Key columns on the suppression side and the matching result columns.
fn suppression_key(
    source: &SuppressionSource,
    dedupe_on: &[String],
) -> Result<(Vec<String>, Vec<String>)> {
    if let Some(map) = &source.field_map {
        let (valid, malformed) = map.partition_malformed();
        for (from, to) in &malformed {
            warn!(
                source = %source.path.display(),
                from = %from,
                to = %to,
                "dropping malformed field map entry"
            );
        }
        if !valid.is_empty() {
            let (from, to): (Vec<String>, Vec<String>) = valid
                .iter()
                .map(|(from, to)| (from.clone(), to.clone()))
                .unzip();
            return Ok((from, to));
        }
    }
    if dedupe_on.is_empty() {
        return Err(CoreError::NoSuppressionKey {
            path: source.path.clone(),
        });
    }
    Ok((dedupe_on.to_vec(), dedupe_on.to_vec()))
}

fn missing_key(path: &Path, table: &Table, columns: &[String]) -> CoreError {
    CoreError::MissingKey {
        path: path.to_path_buf(),
        columns: columns
            .iter()
            .filter(|column| !table.has_column(column))
            .cloned()
            .collect(),
    }
}

/// `result` without the rows whose key appears in `source`.
fn suppress(result: &Table, source: &SuppressionSource, dedupe_on: &[String]) -> Result<Table> {
    let (from, to) = suppression_key(source, dedupe_on)?;
    let from_positions = source
        .table
        .resolve_columns(&from)
        .map_err(|_| missing_key(&source.path, &source.table, &from))?;
    let to_positions = result
        .resolve_columns(&to)
        .map_err(|_| missing_key(&source.path, result, &to))?;
    let audit = result
        .column_index(AUDIT_COLUMN)
        .ok_or_else(|| missing_key(&source.path, result, &[AUDIT_COLUMN.to_string()]))?;

    let keys: HashSet<_> = (0..source.table.height())
        .map(|row| source.table.key(row, &from_positions))
        .filter(|key| !key.is_blank())
        .collect();
    let purged: HashSet<&CellValue> = (0..result.height())
        .filter(|&row| keys.contains(&result.key(row, &to_positions)))
        .map(|row| result.cell(row, audit))
        .collect();
    let mask: Vec<bool> = result
        .column_values(audit)
        .map(|tag| !purged.contains(tag))
        .collect();
    Ok(result.filter(&mask))
}
