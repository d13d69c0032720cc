//! Split a table into many exported files.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use dcs_common::sanitize_token;
use dcs_ingest::write_table;
use dcs_model::{CellValue, CsvOptions, RowKey, SplitSpec, Table};

use crate::error::{CoreError, Result};

/// Value written in place of a missing split cell when rows are kept.
pub const BLANK_TOKEN: &str = "blank";

const DEFAULT_EXTENSION: &str = "csv";
const DEFAULT_STEM: &str = "export";

/// Export `table` as one file per observed combination of `split_on` values.
///
/// Files land in `dest_dir` (the directory of `source_path` when unset)
/// and are named after the source stem plus each split column and value,
/// sanitised to lower-case alphanumerics and underscores. With `chunk_size`
/// a partition larger than the chunk is written as numbered files. With no
/// split columns the table is written as `{stem}_1`, `{stem}_2`, ...
///
/// Returns the written paths in export order.
///
/// # Errors
///
/// Fails for a zero `chunk_size`, for split or output columns the table
/// lacks, and for any write error.
pub fn split_to_files(
    table: &Table,
    source_path: &Path,
    spec: &SplitSpec,
    csv: &CsvOptions,
) -> Result<Vec<PathBuf>> {
    if spec.chunk_size == Some(0) {
        return Err(CoreError::InvalidArgument(
            "chunk_size must be at least 1".to_string(),
        ));
    }
    let split_positions = table.resolve_columns(&spec.split_on)?;
    if let Some(fields) = &spec.fields {
        table.resolve_columns(fields)?;
    }
    let mut naming = Naming::new(source_path, spec.dest_dir.as_deref());

    let written = if split_positions.is_empty() {
        split_by_size(table, spec, &mut naming, csv)?
    } else {
        split_by_values(table, &split_positions, spec, &mut naming, csv)?
    };
    info!(
        source = %source_path.display(),
        files = written.len(),
        rows = table.height(),
        "split"
    );
    Ok(written)
}

/// Output location and file-name parts derived from the source path.
struct Naming {
    dir: PathBuf,
    stem: String,
    extension: String,
    used: HashSet<String>,
}

impl Naming {
    fn new(source_path: &Path, dest_dir: Option<&Path>) -> Self {
        let dir = match dest_dir {
            Some(dir) => dir.to_path_buf(),
            None => source_path
                .parent()
                .filter(|parent| !parent.as_os_str().is_empty())
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf),
        };
        let stem = source_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = source_path
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .filter(|ext| !ext.is_empty())
            .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
        Self {
            dir,
            stem,
            extension,
            used: HashSet::new(),
        }
    }

    /// Claim `chunks` file paths for a partition.
    ///
    /// The sanitised base name gains `_v2`, `_v3`, ... until none of its
    /// final file names (chunk suffix included) has been issued before.
    fn claim(
        &mut self,
        parts: &[(&str, &str)],
        chunks: usize,
        numbered: bool,
    ) -> (String, Vec<PathBuf>) {
        let mut raw = self.stem.clone();
        for (column, value) in parts {
            raw.push('_');
            raw.push_str(column);
            raw.push('_');
            raw.push_str(value);
        }
        let mut base = sanitize_token(&raw);
        if base.is_empty() {
            base = DEFAULT_STEM.to_string();
        }
        let mut candidate = base.clone();
        let mut version = 2;
        loop {
            let names: Vec<String> = (1..=chunks)
                .map(|n| self.file_name(&candidate, numbered.then_some(n)))
                .collect();
            if names.iter().all(|name| !self.used.contains(name)) {
                let paths = names.iter().map(|name| self.dir.join(name)).collect();
                self.used.extend(names);
                return (candidate, paths);
            }
            candidate = format!("{base}_v{version}");
            version += 1;
        }
    }

    fn file_name(&self, base: &str, chunk: Option<usize>) -> String {
        match chunk {
            Some(n) => format!("{base}_{n}.{}", self.extension),
            None => format!("{base}.{}", self.extension),
        }
    }
}

fn chunk_ranges(rows: usize, chunk_size: Option<usize>) -> Vec<(usize, usize)> {
    match chunk_size {
        Some(size) if rows > 0 => (0..rows)
            .step_by(size)
            .map(|start| (start, (start + size).min(rows)))
            .collect(),
        _ => vec![(0, rows)],
    }
}

fn split_by_size(
    table: &Table,
    spec: &SplitSpec,
    naming: &mut Naming,
    csv: &CsvOptions,
) -> Result<Vec<PathBuf>> {
    let output = project(table, spec)?;
    let ranges = chunk_ranges(output.height(), spec.chunk_size);
    let (_, paths) = naming.claim(&[], ranges.len(), true);
    for ((start, end), path) in ranges.into_iter().zip(&paths) {
        let rows: Vec<usize> = (start..end).collect();
        write_table(&output.take(&rows), path, csv)?;
    }
    Ok(paths)
}

fn split_by_values(
    table: &Table,
    split_positions: &[usize],
    spec: &SplitSpec,
    naming: &mut Naming,
    csv: &CsvOptions,
) -> Result<Vec<PathBuf>> {
    let prepared = fill_or_drop(table, split_positions, spec.dropna);
    let output = project(&prepared, spec)?;

    let mut groups: Vec<(RowKey, Vec<usize>)> = Vec::new();
    let mut group_of_key: HashMap<RowKey, usize> = HashMap::new();
    for row in 0..prepared.height() {
        let key = prepared.key(row, split_positions);
        let group = *group_of_key.entry(key.clone()).or_insert_with(|| {
            groups.push((key, Vec::new()));
            groups.len() - 1
        });
        groups[group].1.push(row);
    }

    let mut written = Vec::new();
    for (key, rows) in &groups {
        let parts: Vec<(&str, &str)> = spec
            .split_on
            .iter()
            .zip(key.values())
            .map(|(column, value)| (column.as_str(), value.display()))
            .collect();
        let ranges = chunk_ranges(rows.len(), spec.chunk_size);
        let (base, paths) = naming.claim(&parts, ranges.len(), ranges.len() > 1);
        for ((start, end), path) in ranges.into_iter().zip(paths) {
            write_table(&output.take(&rows[start..end]), &path, csv)?;
            written.push(path);
        }
        debug!(partition = %base, rows = rows.len(), "exported partition");
    }
    Ok(written)
}

/// Drop rows with a missing split value, or fill those cells with [`BLANK_TOKEN`].
fn fill_or_drop(table: &Table, split_positions: &[usize], dropna: bool) -> Table {
    if dropna {
        let mask: Vec<bool> = (0..table.height())
            .map(|row| {
                split_positions
                    .iter()
                    .all(|&position| !table.cell(row, position).is_missing())
            })
            .collect();
        let kept = table.filter(&mask);
        debug!(
            dropped = table.height() - kept.height(),
            "dropped rows with missing split values"
        );
        return kept;
    }
    let mut filled = table.clone();
    for row in 0..filled.height() {
        for &position in split_positions {
            if filled.cell(row, position).is_missing() {
                filled.set_cell(row, position, CellValue::Text(BLANK_TOKEN.to_string()));
            }
        }
    }
    filled
}

fn project(table: &Table, spec: &SplitSpec) -> Result<Table> {
    Ok(match &spec.fields {
        Some(fields) => table.select(fields)?,
        None => table.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_ranges_cover_every_row() {
        assert_eq!(chunk_ranges(5, Some(2)), vec![(0, 2), (2, 4), (4, 5)]);
        assert_eq!(chunk_ranges(4, None), vec![(0, 4)]);
        assert_eq!(chunk_ranges(0, Some(3)), vec![(0, 0)]);
    }

    #[test]
    fn names_are_sanitised_and_unique() {
        let mut naming = Naming::new(Path::new("data/People List.csv"), None);
        assert_eq!(naming.dir, PathBuf::from("data"));
        let (first, _) = naming.claim(&[("State", "New York")], 1, false);
        let (second, paths) = naming.claim(&[("State", "new-york")], 3, true);
        assert_eq!(first, "people_list_state_new_york");
        assert_eq!(second, "people_list_state_new_york_v2");
        assert_eq!(
            paths[2],
            PathBuf::from("data/people_list_state_new_york_v2_3.csv")
        );
    }

    #[test]
    fn chunk_suffixes_count_towards_uniqueness() {
        let mut naming = Naming::new(Path::new("s.csv"), None);
        let (_, chunked) = naming.claim(&[("state", "a")], 2, true);
        let (base, single) = naming.claim(&[("state", "a 1")], 1, false);
        assert_eq!(chunked[0], PathBuf::from("./s_state_a_1.csv"));
        assert_eq!(base, "s_state_a_1_v2");
        assert_eq!(single, vec![PathBuf::from("./s_state_a_1_v2.csv")]);
    }

    #[test]
    fn missing_split_values_are_filled_or_dropped() {
        let table = Table::from_strings(&["state", "n"], &[&["", "1"], &["CA", "2"]]).unwrap();
        let filled = fill_or_drop(&table, &[0], false);
        assert_eq!(filled.value(0, "state").unwrap().display(), BLANK_TOKEN);
        let dropped = fill_or_drop(&table, &[0], true);
        assert_eq!(dropped.height(), 1);
        assert_eq!(dropped.value(0, "state").unwrap().display(), "CA");
    }
}
