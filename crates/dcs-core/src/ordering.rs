//! Stable ordering and first-wins deduplication.
//!
//! Sorting and duplicate removal are kept as two explicit steps: a stable,
//! dtype-aware sort, then a single pass that keeps the first row seen for
//! each key tuple. Which duplicate survives is therefore fully determined
//! by the row order produced by the sort.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::NaiveDateTime;

use dcs_common::parse_f64;
use dcs_model::{CellValue, ColumnType, SortSpec, Table, TableError, parse_timestamp};

#[derive(Debug)]
enum SortValue<'a> {
    Number(f64),
    Time(NaiveDateTime),
    Text(&'a str),
    Missing,
}

impl SortValue<'_> {
    fn rank(&self) -> u8 {
        match self {
            Self::Number(_) => 0,
            Self::Time(_) => 1,
            Self::Text(_) => 2,
            Self::Missing => 3,
        }
    }
}

fn sort_value(cell: &CellValue, kind: ColumnType) -> SortValue<'_> {
    let Some(text) = cell.as_text() else {
        return SortValue::Missing;
    };
    match kind {
        ColumnType::Numeric => parse_f64(text).map_or(SortValue::Text(text), SortValue::Number),
        ColumnType::Timestamp => parse_timestamp(text).map_or(SortValue::Text(text), SortValue::Time),
        ColumnType::Text => SortValue::Text(text),
    }
}

fn compare_present(a: &SortValue<'_>, b: &SortValue<'_>) -> Ordering {
    match (a, b) {
        (SortValue::Number(x), SortValue::Number(y)) => x.total_cmp(y),
        (SortValue::Time(x), SortValue::Time(y)) => x.cmp(y),
        (SortValue::Text(x), SortValue::Text(y)) => x.cmp(y),
        _ => a.rank().cmp(&b.rank()),
    }
}

/// Row positions of `table` in `spec` order.
///
/// The sort is stable. Descending columns reverse the comparison, not the
/// row sequence, and missing cells sort last in either direction.
pub fn sort_order(table: &Table, spec: &SortSpec) -> Result<Vec<usize>, TableError> {
    let mut order: Vec<usize> = (0..table.height()).collect();
    if spec.is_empty() {
        return Ok(order);
    }
    let keys = spec.keys();
    let positions = table.resolve_columns(&spec.columns)?;
    let columns: Vec<(Vec<SortValue<'_>>, bool)> = positions
        .iter()
        .zip(&keys)
        .map(|(&position, key)| {
            let kind = table
                .column_type(&key.column)
                .unwrap_or(ColumnType::Text);
            let values = table
                .column_values(position)
                .map(|cell| sort_value(cell, kind))
                .collect();
            (values, key.ascending)
        })
        .collect();
    order.sort_by(|&a, &b| {
        for (values, ascending) in &columns {
            let ordering = match (&values[a], &values[b]) {
                (SortValue::Missing, SortValue::Missing) => Ordering::Equal,
                (SortValue::Missing, _) => Ordering::Greater,
                (_, SortValue::Missing) => Ordering::Less,
                (x, y) if *ascending => compare_present(x, y),
                (x, y) => compare_present(x, y).reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
    Ok(order)
}

/// Copy of `table` with rows in `spec` order.
pub fn sort_table(table: &Table, spec: &SortSpec) -> Result<Table, TableError> {
    Ok(table.take(&sort_order(table, spec)?))
}

/// Split row positions into first occurrences and repeats of each key tuple.
pub(crate) fn first_wins(table: &Table, key_columns: &[usize]) -> (Vec<usize>, Vec<usize>) {
    let mut seen = HashSet::with_capacity(table.height());
    let mut kept = Vec::with_capacity(table.height());
    let mut repeated = Vec::new();
    for row in 0..table.height() {
        if seen.insert(table.key(row, key_columns)) {
            kept.push(row);
        } else {
            repeated.push(row);
        }
    }
    (kept, repeated)
}

/// Keep the first row per `key_columns` tuple in current row order.
///
/// Returns `(kept, dropped)`; both preserve row order and labels.
pub fn dedupe_first_wins<S: AsRef<str>>(
    table: &Table,
    key_columns: &[S],
) -> Result<(Table, Table), TableError> {
    let positions = table.resolve_columns(key_columns)?;
    let (kept, repeated) = first_wins(table, &positions);
    Ok((table.take(&kept), table.take(&repeated)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(table: &Table, name: &str) -> Vec<String> {
        let position = table.column_index(name).unwrap();
        table
            .column_values(position)
            .map(|cell| cell.display().to_string())
            .collect()
    }

    #[test]
    fn numeric_columns_sort_by_value() {
        let table = Table::from_strings(&["n"], &[&["10"], &["9"], &["100"]]).unwrap();
        let sorted = sort_table(&table, &SortSpec::uniform(vec!["n".into()], true)).unwrap();
        assert_eq!(column(&sorted, "n"), vec!["9", "10", "100"]);
    }

    #[test]
    fn timestamps_sort_chronologically() {
        let table = Table::from_strings(
            &["when"],
            &[&["12/31/2023"], &["2024-01-02"], &["2023-06-01 08:00:00"]],
        )
        .unwrap();
        let sorted = sort_table(&table, &SortSpec::uniform(vec!["when".into()], false)).unwrap();
        assert_eq!(
            column(&sorted, "when"),
            vec!["2024-01-02", "12/31/2023", "2023-06-01 08:00:00"]
        );
    }

    #[test]
    fn missing_sorts_last_in_both_directions() {
        let table = Table::from_strings(&["v"], &[&[""], &["b"], &["a"]]).unwrap();
        let up = sort_table(&table, &SortSpec::uniform(vec!["v".into()], true)).unwrap();
        let down = sort_table(&table, &SortSpec::uniform(vec!["v".into()], false)).unwrap();
        assert_eq!(column(&up, "v"), vec!["a", "b", ""]);
        assert_eq!(column(&down, "v"), vec!["b", "a", ""]);
    }

    #[test]
    fn descending_sort_keeps_ties_stable() {
        let table = Table::from_strings(
            &["k", "tag"],
            &[&["1", "first"], &["2", "x"], &["1", "second"]],
        )
        .unwrap();
        let sorted = sort_table(&table, &SortSpec::uniform(vec!["k".into()], false)).unwrap();
        assert_eq!(column(&sorted, "tag"), vec!["x", "first", "second"]);
    }

    #[test]
    fn secondary_column_breaks_ties() {
        let table = Table::from_strings(
            &["a", "b"],
            &[&["1", "x"], &["1", "z"], &["0", "y"]],
        )
        .unwrap();
        let spec = SortSpec::new(vec!["a".into(), "b".into()], vec![true]);
        let sorted = sort_table(&table, &spec).unwrap();
        assert_eq!(column(&sorted, "b"), vec!["y", "z", "x"]);
    }

    #[test]
    fn unknown_sort_column_is_an_error() {
        let table = Table::from_strings(&["a"], &[&["1"]]).unwrap();
        let err = sort_order(&table, &SortSpec::uniform(vec!["nope".into()], true)).unwrap_err();
        assert_eq!(
            err,
            TableError::MissingColumns {
                columns: vec!["nope".into()]
            }
        );
    }

    #[test]
    fn first_occurrence_wins_including_blank_keys() {
        let table = Table::from_strings(
            &["k", "tag"],
            &[&["a", "1"], &["", "2"], &["a", "3"], &["", "4"]],
        )
        .unwrap();
        let (kept, dropped) = dedupe_first_wins(&table, &["k"]).unwrap();
        assert_eq!(column(&kept, "tag"), vec!["1", "2"]);
        assert_eq!(column(&dropped, "tag"), vec!["3", "4"]);
        assert_eq!(dropped.index(), &[2, 3]);
    }
}
