//! Field overlay ("upsert") of one table onto another.
//!
//! Rows are matched through an explicit hash map from key to source row.
//! A table is keyed either by a named column or, when it has no such
//! column, by its row index labels rendered as text, so a column-keyed
//! table can be matched against an index-keyed one.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use dcs_model::{CellValue, GatherOptions, Table};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keying {
    Column(usize),
    Index,
}

impl Keying {
    fn resolve(table: &Table, label: Option<&str>) -> Self {
        label
            .and_then(|name| table.column_index(name))
            .map_or(Self::Index, Self::Column)
    }

    /// Key of `row`; `None` when the key cell is missing.
    fn key(self, table: &Table, row: usize) -> Option<String> {
        match self {
            Self::Column(position) => table.cell(row, position).as_text().map(str::to_string),
            Self::Index => Some(table.label(row).to_string()),
        }
    }
}

/// Overlay `source` values onto `target` rows with the same key.
///
/// Non-missing source cells overwrite the matching target cells for the
/// selected fields; missing source cells leave the target value alone.
/// Fields the target lacks are added as columns. When several source rows
/// share a key the first one supplies the values; every target row with
/// that key is updated. With `append_missing`, source rows whose key is not
/// in the target are appended with all of their columns. Source rows with
/// a missing key cell never match and are never appended.
///
/// # Errors
///
/// Fails when `fields` names a column `source` does not have.
pub fn gather_fields(target: &Table, source: &Table, options: &GatherOptions) -> Result<Table> {
    let label = options.index_label.as_deref();
    let target_keying = Keying::resolve(target, label);
    let source_keying = Keying::resolve(source, label);
    let source_key_column = match source_keying {
        Keying::Column(position) => Some(position),
        Keying::Index => None,
    };

    let fields: Vec<usize> = match &options.fields {
        Some(fields) => source.resolve_columns(fields)?,
        None => (0..source.width()).collect(),
    };
    let fields: Vec<usize> = fields
        .into_iter()
        .filter(|&position| Some(position) != source_key_column)
        .filter(|&position| label != Some(source.columns()[position].as_str()))
        .collect();

    let mut first_row_of_key: HashMap<String, usize> = HashMap::with_capacity(source.height());
    let mut unkeyed = 0usize;
    for row in 0..source.height() {
        match source_keying.key(source, row) {
            Some(key) => {
                first_row_of_key.entry(key).or_insert(row);
            }
            None => unkeyed += 1,
        }
    }

    let mut gathered = target.clone();
    let targets: Vec<(usize, usize)> = fields
        .iter()
        .map(|&position| (position, gathered.ensure_column(&source.columns()[position])))
        .collect();

    let mut matched_keys = HashSet::new();
    let mut updated = 0usize;
    for row in 0..gathered.height() {
        let Some(key) = target_keying.key(&gathered, row) else {
            continue;
        };
        let Some(&source_row) = first_row_of_key.get(&key) else {
            continue;
        };
        for &(from, to) in &targets {
            let value = source.cell(source_row, from);
            if !value.is_missing() {
                gathered.set_cell(row, to, value.clone());
            }
        }
        matched_keys.insert(key);
        updated += 1;
    }

    let mut appended = 0usize;
    if options.append_missing {
        let preserve_labels = target_keying == Keying::Index && source_keying == Keying::Index;
        for row in 0..source.height() {
            let Some(key) = source_keying.key(source, row) else {
                continue;
            };
            if matched_keys.contains(&key) {
                continue;
            }
            append_source_row(&mut gathered, source, row, target_keying, &key, preserve_labels)?;
            appended += 1;
        }
    }

    debug!(
        fields = targets.len(),
        updated,
        appended,
        unkeyed_source_rows = unkeyed,
        "gathered fields"
    );
    Ok(gathered)
}

fn append_source_row(
    gathered: &mut Table,
    source: &Table,
    row: usize,
    target_keying: Keying,
    key: &str,
    preserve_label: bool,
) -> Result<()> {
    let positions: Vec<usize> = source
        .columns()
        .iter()
        .map(|name| gathered.ensure_column(name))
        .collect();
    let mut cells = vec![CellValue::Missing; gathered.width()];
    for (value, &position) in source.row(row).iter().zip(&positions) {
        cells[position] = value.clone();
    }
    if let Keying::Column(position) = target_keying
        && cells[position].is_missing()
    {
        cells[position] = CellValue::Text(key.to_string());
    }
    if preserve_label {
        gathered.push_row_labelled(cells, source.label(row))?;
    } else {
        gathered.push_row(cells)?;
    }
    Ok(())
}
