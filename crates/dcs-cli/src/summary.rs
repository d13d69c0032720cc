use anyhow::{Context, Result};
use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use dcs_model::ExecutionReport;

use crate::cli::ReportFormatArg;
use crate::types::{MergePurgeResult, OperationResult};

pub fn print_merge_purge(result: &MergePurgeResult) -> Result<()> {
    if result.report_format == ReportFormatArg::Json {
        let json = serde_json::to_string_pretty(&result.report).context("serialize report")?;
        println!("{json}");
        return Ok(());
    }
    let report = &result.report;
    println!("Primary: {}", report.primary.display());
    match &result.exported {
        Some(paths) => {
            println!("Output: {}", paths.table.display());
            println!("Report: {}", paths.report.display());
        }
        None => println!("Output: (dry run, nothing written)"),
    }
    println!("{}", phase_table(report));
    if result.exported.is_none() {
        println!();
        print!("{}", report.render());
    }
    if let Some(frame) = &result.preview {
        println!();
        println!("{frame}");
    }
    Ok(())
}

fn phase_table(report: &ExecutionReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Phase"),
        header_cell("Source"),
        header_cell("Rows"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);

    table.add_row(vec![
        Cell::new("primary"),
        Cell::new(report.primary.display()),
        Cell::new(report.original_rows),
    ]);
    for delta in &report.merges {
        table.add_row(vec![
            Cell::new("merge"),
            Cell::new(delta.source.display()),
            delta_cell('+', delta.rows, Color::Green),
        ]);
    }
    for delta in &report.suppressions {
        table.add_row(vec![
            Cell::new("suppress"),
            Cell::new(delta.source.display()),
            delta_cell('-', delta.rows, Color::Red),
        ]);
    }
    let key = if report.dedupe_on.is_empty() {
        "-".to_string()
    } else {
        report.dedupe_on.join(", ")
    };
    table.add_row(vec![
        Cell::new("dedupe"),
        dim_cell(key),
        delta_cell('-', report.dedupe_lost, Color::Yellow),
    ]);
    table.add_row(vec![
        Cell::new("FINAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        Cell::new(report.final_rows).add_attribute(Attribute::Bold),
    ]);
    table
}

pub fn print_operation(result: &OperationResult) {
    println!("Operation: {}", result.operation);
    println!("Input: {} ({} rows)", result.input.display(), result.input_rows);
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("File"),
        header_cell("Role"),
        header_cell("Rows"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    for file in &result.files {
        table.add_row(vec![
            Cell::new(file.path.display()),
            Cell::new(file.role),
            file.rows.map_or_else(|| dim_cell("-"), Cell::new),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(format!("{} files", result.files.len())),
        dim_cell("-"),
    ]);
    println!("{table}");
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn delta_cell(sign: char, rows: usize, color: Color) -> Cell {
    if rows == 0 {
        dim_cell(0)
    } else {
        Cell::new(format!("{sign}{rows}")).fg(color)
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
