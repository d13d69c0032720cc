//! Surrogate id assignment.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use tracing::debug;

use dcs_common::{coerce_id, parse_i64};
use dcs_model::{CellValue, Table};

use crate::error::{CoreError, Result};

/// Give every distinct `key_columns` tuple a positive integer id in `id_column`.
///
/// Rows sharing a key share an id. When `id_column` already exists its
/// values are coerced to integers and every positive id is kept; keys
/// without one are numbered from the largest existing id plus one. When it
/// does not exist, keys are numbered from `start` in first-occurrence
/// order and the column is appended last.
///
/// # Errors
///
/// Returns [`CoreError::IdIntegrity`] when two distinct keys already carry
/// the same id, [`CoreError::InvalidArgument`] for an empty key, a
/// non-positive `start`, or a key that includes `id_column`, and a table
/// error when a key column is absent.
pub fn assign_ids<S: AsRef<str>>(
    table: &Table,
    key_columns: &[S],
    id_column: &str,
    start: i64,
) -> Result<Table> {
    if key_columns.is_empty() {
        return Err(CoreError::InvalidArgument(
            "id assignment needs at least one key column".to_string(),
        ));
    }
    if start < 1 {
        return Err(CoreError::InvalidArgument(format!(
            "id start must be at least 1, got {start}"
        )));
    }
    if key_columns.iter().any(|key| key.as_ref() == id_column) {
        return Err(CoreError::InvalidArgument(format!(
            "id column '{id_column}' cannot be part of its own key"
        )));
    }
    let positions = table.resolve_columns(key_columns)?;
    let id_position = table.column_index(id_column);

    let mut slot_of_key = HashMap::new();
    let mut representatives = Vec::new();
    let mut row_slots = Vec::with_capacity(table.height());
    for row in 0..table.height() {
        let slot = match slot_of_key.entry(table.key(row, &positions)) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                representatives.push(row);
                *entry.insert(representatives.len() - 1)
            }
        };
        row_slots.push(slot);
    }

    let mut ids: Vec<i64> = vec![0; representatives.len()];
    let mut recovered = 0usize;
    if let Some(position) = id_position {
        for (id, &row) in ids.iter_mut().zip(&representatives) {
            if let Some(text) = table.cell(row, position).as_text() {
                *id = coerce_id(text);
                if parse_i64(text).is_none() {
                    recovered += 1;
                }
            }
        }
    }
    let mut next = match ids.iter().copied().filter(|id| *id > 0).max() {
        Some(max) => max.checked_add(1),
        None => Some(start),
    };
    let mut issued = 0usize;
    for id in &mut ids {
        if *id <= 0 {
            let Some(value) = next else {
                return Err(CoreError::InvalidArgument(format!(
                    "no ids left in '{id_column}' after {}",
                    i64::MAX
                )));
            };
            *id = value;
            next = value.checked_add(1);
            issued += 1;
        }
    }

    let distinct: HashSet<i64> = ids.iter().copied().collect();
    if distinct.len() != representatives.len() {
        return Err(CoreError::IdIntegrity {
            id_column: id_column.to_string(),
            distinct_ids: distinct.len(),
            distinct_keys: representatives.len(),
        });
    }

    let values: Vec<CellValue> = row_slots
        .iter()
        .map(|&slot| CellValue::Text(ids[slot].to_string()))
        .collect();
    let mut assigned = table.clone();
    match id_position {
        Some(position) => {
            for (row, value) in values.into_iter().enumerate() {
                assigned.set_cell(row, position, value);
            }
        }
        None => assigned.add_column(id_column, values)?,
    }
    debug!(
        id_column,
        keys = representatives.len(),
        issued,
        recovered,
        "assigned ids"
    );
    Ok(assigned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(table: &Table, column: &str) -> Vec<String> {
        let position = table.column_index(column).unwrap();
        table
            .column_values(position)
            .map(|cell| cell.display().to_string())
            .collect()
    }

    #[test]
    fn fresh_column_numbers_keys_from_start() {
        let table =
            Table::from_strings(&["email"], &[&["a@x"], &["b@x"], &["a@x"], &["c@x"]]).unwrap();
        let assigned = assign_ids(&table, &["email"], "uid", 100).unwrap();
        assert_eq!(assigned.columns(), &["email", "uid"]);
        assert_eq!(ids(&assigned, "uid"), vec!["100", "101", "100", "102"]);
    }

    #[test]
    fn existing_ids_are_kept_and_gaps_filled() {
        let table = Table::from_strings(
            &["uid", "email"],
            &[&["7", "a@x"], &["", "b@x"], &["junk", "c@x"], &["3", "d@x"]],
        )
        .unwrap();
        let assigned = assign_ids(&table, &["email"], "uid", 1).unwrap();
        assert_eq!(assigned.columns(), &["uid", "email"]);
        assert_eq!(ids(&assigned, "uid"), vec!["7", "8", "9", "3"]);
    }

    #[test]
    fn garbage_digits_are_recovered() {
        let table = Table::from_strings(&["uid", "k"], &[&["ID-12", "a"], &["-4", "b"]]).unwrap();
        let assigned = assign_ids(&table, &["k"], "uid", 1).unwrap();
        assert_eq!(ids(&assigned, "uid"), vec!["12", "13"]);
    }

    #[test]
    fn rows_sharing_a_key_share_the_first_id() {
        let table =
            Table::from_strings(&["uid", "k"], &[&["5", "a"], &["9", "a"], &["", "b"]]).unwrap();
        let assigned = assign_ids(&table, &["k"], "uid", 1).unwrap();
        assert_eq!(ids(&assigned, "uid"), vec!["5", "5", "6"]);
    }

    #[test]
    fn duplicated_existing_ids_violate_integrity() {
        let table = Table::from_strings(&["uid", "k"], &[&["4", "a"], &["4", "b"]]).unwrap();
        let err = assign_ids(&table, &["k"], "uid", 1).unwrap_err();
        assert!(matches!(
            err,
            CoreError::IdIntegrity {
                distinct_ids: 1,
                distinct_keys: 2,
                ..
            }
        ));
    }

    #[test]
    fn rejects_bad_arguments() {
        let table = Table::from_strings(&["k"], &[&["a"]]).unwrap();
        let empty: [&str; 0] = [];
        assert!(matches!(
            assign_ids(&table, &empty, "uid", 1),
            Err(CoreError::InvalidArgument(_))
        ));
        assert!(matches!(
            assign_ids(&table, &["k"], "uid", 0),
            Err(CoreError::InvalidArgument(_))
        ));
        assert!(matches!(
            assign_ids(&table, &["k"], "k", 1),
            Err(CoreError::InvalidArgument(_))
        ));
        assert!(matches!(
            assign_ids(&table, &["missing"], "uid", 1),
            Err(CoreError::Table(_))
        ));
    }

    #[test]
    fn largest_id_is_kept_until_a_new_one_is_needed() {
        let max = i64::MAX.to_string();
        let table = Table::from_strings(&["uid", "k"], &[&[max.as_str(), "a"]]).unwrap();
        let assigned = assign_ids(&table, &["k"], "uid", 1).unwrap();
        assert_eq!(ids(&assigned, "uid"), vec![max.clone()]);

        let table =
            Table::from_strings(&["uid", "k"], &[&[max.as_str(), "a"], &["", "b"]]).unwrap();
        assert!(matches!(
            assign_ids(&table, &["k"], "uid", 1),
            Err(CoreError::InvalidArgument(_))
        ));
    }

    #[test]
    fn empty_table_gets_an_empty_id_column() {
        let table = Table::new(vec!["k".into()]).unwrap();
        let assigned = assign_ids(&table, &["k"], "uid", 1).unwrap();
        assert_eq!(assigned.columns(), &["k", "uid"]);
        assert!(assigned.is_empty());
    }
}
