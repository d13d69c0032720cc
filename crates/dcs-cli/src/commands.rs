use anyhow::{Context, Result};
use tracing::info;

use dcs_core::{
    MergePurgeRequest, assign_ids, execute, gather_fields, partition_duplicates, run,
    split_to_files,
};
use dcs_ingest::{preview_frame, read_table, write_table};
use dcs_model::{CsvOptions, GatherOptions};

use dcs_cli::config::{
    MergePurgeOverrides, SplitOverrides, resolve_merge_purge_job, resolve_split_job, sibling_path,
};

use crate::cli::{AssignIdsArgs, CsvArgs, DedupeArgs, GatherArgs, MergePurgeArgs, SplitArgs};
use crate::types::{MergePurgeResult, OperationResult, WrittenFile};

fn csv_options(args: CsvArgs) -> CsvOptions {
    CsvOptions {
        delimiter: args.delimiter,
    }
}

pub fn run_merge_purge(args: &MergePurgeArgs) -> Result<MergePurgeResult> {
    let overrides = MergePurgeOverrides {
        primary: args.primary.clone(),
        output: args.output.clone(),
        merge: args.merge.clone(),
        suppress: args.suppress.clone(),
        field_map: args.field_map.clone(),
        dedupe_on: args.dedupe_on.clone(),
        sort: args.sort.clone(),
        ascending: args.ascending.clone(),
        delimiter: args.csv.delimiter,
    };
    let job = resolve_merge_purge_job(args.job.as_deref(), overrides)?;
    let request = MergePurgeRequest::from_job(&job).context("load merge-purge inputs")?;

    let (outcome, exported) = if args.dry_run {
        (execute(&request).context("merge-purge")?, None)
    } else {
        let (outcome, paths) = run(&request, &job.output, &job.csv)
            .with_context(|| format!("merge-purge into {}", job.output.display()))?;
        (outcome, Some(paths))
    };
    let preview = args
        .preview
        .map(|rows| preview_frame(&outcome.table, rows))
        .transpose()
        .context("build result preview")?;
    Ok(MergePurgeResult {
        report: outcome.report,
        exported,
        report_format: args.report_format,
        preview,
    })
}

pub fn run_dedupe(args: &DedupeArgs) -> Result<OperationResult> {
    let csv = csv_options(args.csv);
    let table = read_table(&args.input, &csv)
        .with_context(|| format!("read {}", args.input.display()))?;
    let partition = partition_duplicates(
        &table,
        &args.id_column,
        &args.key,
        &args.sort,
        args.ascending.as_deref(),
    )
    .context("partition duplicates")?;

    let kept = args
        .kept
        .clone()
        .unwrap_or_else(|| sibling_path(&args.input, "_kept"));
    let superseded = args
        .superseded
        .clone()
        .unwrap_or_else(|| sibling_path(&args.input, "_superseded"));
    write_table(&partition.kept, &kept, &csv)
        .with_context(|| format!("write {}", kept.display()))?;
    write_table(&partition.superseded, &superseded, &csv)
        .with_context(|| format!("write {}", superseded.display()))?;
    info!(
        kept = partition.kept.height(),
        superseded = partition.superseded.height(),
        "deduplicated"
    );
    Ok(OperationResult {
        operation: "dedupe",
        input: args.input.clone(),
        input_rows: table.height(),
        files: vec![
            WrittenFile {
                role: "kept",
                path: kept,
                rows: Some(partition.kept.height()),
            },
            WrittenFile {
                role: "superseded",
                path: superseded,
                rows: Some(partition.superseded.height()),
            },
        ],
    })
}

pub fn run_assign_ids(args: &AssignIdsArgs) -> Result<OperationResult> {
    let csv = csv_options(args.csv);
    let table = read_table(&args.input, &csv)
        .with_context(|| format!("read {}", args.input.display()))?;
    let assigned =
        assign_ids(&table, &args.key, &args.id_column, args.start).context("assign ids")?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| sibling_path(&args.input, "_ids"));
    write_table(&assigned, &output, &csv)
        .with_context(|| format!("write {}", output.display()))?;
    Ok(OperationResult {
        operation: "assign-ids",
        input: args.input.clone(),
        input_rows: table.height(),
        files: vec![WrittenFile {
            role: "output",
            path: output,
            rows: Some(assigned.height()),
        }],
    })
}

pub fn run_gather(args: &GatherArgs) -> Result<OperationResult> {
    let csv = csv_options(args.csv);
    let target = read_table(&args.target, &csv)
        .with_context(|| format!("read {}", args.target.display()))?;
    let source = read_table(&args.source, &csv)
        .with_context(|| format!("read {}", args.source.display()))?;
    let options = GatherOptions {
        index_label: args.on.clone(),
        fields: args.fields.clone(),
        append_missing: !args.no_append,
    };
    let gathered = gather_fields(&target, &source, &options).context("gather fields")?;
    write_table(&gathered, &args.output, &csv)
        .with_context(|| format!("write {}", args.output.display()))?;
    Ok(OperationResult {
        operation: "gather",
        input: args.target.clone(),
        input_rows: target.height(),
        files: vec![WrittenFile {
            role: "output",
            path: args.output.clone(),
            rows: Some(gathered.height()),
        }],
    })
}

pub fn run_split(args: &SplitArgs) -> Result<OperationResult> {
    let overrides = SplitOverrides {
        input: args.input.clone(),
        split_on: args.split_on.clone(),
        fields: args.fields.clone(),
        dropna: args.dropna,
        dest_dir: args.dest_dir.clone(),
        chunk_size: args.chunk_size,
        delimiter: args.csv.delimiter,
    };
    let job = resolve_split_job(args.job.as_deref(), overrides)?;
    let table = read_table(&job.input, &job.csv)
        .with_context(|| format!("read {}", job.input.display()))?;
    let written = split_to_files(&table, &job.input, &job.spec, &job.csv)
        .with_context(|| format!("split {}", job.input.display()))?;
    Ok(OperationResult {
        operation: "split",
        input: job.input,
        input_rows: table.height(),
        files: written
            .into_iter()
            .map(|path| WrittenFile {
                role: "part",
                path,
                rows: None,
            })
            .collect(),
    })
}
