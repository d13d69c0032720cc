//! Kept / superseded duplicate partitioning.

use tracing::debug;

use dcs_model::{SortSpec, Table};

use crate::error::Result;
use crate::ids::assign_ids;
use crate::ordering::{first_wins, sort_table};

/// Result of [`partition_duplicates`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    /// One row per distinct key, carrying its id.
    pub kept: Table,
    /// Rows displaced by an earlier row with the same key.
    pub superseded: Table,
}

impl Partition {
    pub fn total_rows(&self) -> usize {
        self.kept.height() + self.superseded.height()
    }
}

/// Split `table` into one surviving row per key and the rows it displaces.
///
/// Rows are first sorted by `sort_columns` in `ascending` order (all
/// ascending when `None`) so ids are issued deterministically, then sorted
/// again with every direction flipped. The first row per key in that second
/// order is kept. With `sort_columns = [updated]` and the default
/// directions the newest row per key survives.
pub fn partition_duplicates<S: AsRef<str>>(
    table: &Table,
    id_column: &str,
    key_columns: &[S],
    sort_columns: &[S],
    ascending: Option<&[bool]>,
) -> Result<Partition> {
    let columns: Vec<String> = sort_columns
        .iter()
        .map(|column| column.as_ref().to_string())
        .collect();
    let pre = match ascending {
        Some(flags) => SortSpec::new(columns, flags.to_vec()),
        None => SortSpec::uniform(columns, true),
    };
    let post = pre.reversed();

    let ordered = sort_table(table, &pre)?;
    let identified = assign_ids(&ordered, key_columns, id_column, 1)?;
    let ordered = sort_table(&identified, &post)?;

    let positions = ordered.resolve_columns(key_columns)?;
    let (kept, superseded) = first_wins(&ordered, &positions);
    debug!(
        id_column,
        kept = kept.len(),
        superseded = superseded.len(),
        "partitioned duplicates"
    );
    Ok(Partition {
        kept: ordered.take(&kept),
        superseded: ordered.take(&superseded),
    })
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

    fn visits() -> Table {
        Table::from_strings(
            &["email", "visited", "note"],
            &[
                &["a@x", "2024-01-01", "old-a"],
                &["b@x", "2024-02-01", "only-b"],
                &["a@x", "2024-03-01", "new-a"],
                &["a@x", "2024-02-01", "mid-a"],
            ],
        )
        .unwrap()
    }

    #[test]
    fn default_directions_keep_the_newest_row() {
        let partition =
            partition_duplicates(&visits(), "uid", &["email"], &["visited"], None).unwrap();
        assert_eq!(column(&partition.kept, "note"), vec!["new-a", "only-b"]);
        assert_eq!(column(&partition.superseded, "note"), vec!["mid-a", "old-a"]);
        assert_eq!(partition.total_rows(), 4);
    }

    #[test]
    fn ids_follow_the_pre_sort_order() {
        let partition =
            partition_duplicates(&visits(), "uid", &["email"], &["visited"], None).unwrap();
        // a@x is first in visit order, so it gets id 1.
        assert_eq!(column(&partition.kept, "uid"), vec!["1", "2"]);
        assert_eq!(column(&partition.superseded, "uid"), vec!["1", "1"]);
    }

    #[test]
    fn explicit_directions_are_negated_for_the_keep_pass() {
        let flags = [false];
        let partition =
            partition_duplicates(&visits(), "uid", &["email"], &["visited"], Some(&flags))
                .unwrap();
        assert_eq!(column(&partition.kept, "note"), vec!["old-a", "only-b"]);
    }

    #[test]
    fn no_sort_columns_keeps_first_occurrence() {
        let none: [&str; 0] = [];
        let partition = partition_duplicates(&visits(), "uid", &["email"], &none, None).unwrap();
        assert_eq!(column(&partition.kept, "note"), vec!["old-a", "only-b"]);
        assert_eq!(partition.superseded.height(), 2);
    }

    #[test]
    fn empty_input_partitions_cleanly() {
        let table = visits().empty_like();
        let partition =
            partition_duplicates(&table, "uid", &["email"], &["visited"], None).unwrap();
        assert!(partition.kept.is_empty());
        assert!(partition.superseded.is_empty());
        assert!(partition.kept.has_column("uid"));
    }
}
