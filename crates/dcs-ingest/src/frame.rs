//! Typed Polars frames for displaying tables.
//!
//! Cells stay text inside a [`Table`]; a preview frame gives each column
//! the dtype its values support so numbers line up and nulls show as such.

use polars::prelude::{Column, DataFrame, NamedFrom};

use dcs_common::{parse_f64, parse_i64};
use dcs_model::{CellValue, ColumnType, Table};

use crate::error::Result;

/// Build a `DataFrame` from a [`Table`].
///
/// Numeric columns become `Int64` when every value is an integer and
/// `Float64` otherwise. Every other column is `String`. Missing cells are null.
pub fn frame_from_table(table: &Table) -> Result<DataFrame> {
    let mut columns = Vec::with_capacity(table.width());
    for (position, name) in table.columns().iter().enumerate() {
        let texts: Vec<Option<&str>> = table
            .column_values(position)
            .map(CellValue::as_text)
            .collect();
        let column = match table.column_type(name) {
            Some(ColumnType::Numeric) if texts.iter().flatten().all(|t| parse_i64(t).is_some()) => {
                let values: Vec<Option<i64>> =
                    texts.iter().map(|text| text.and_then(parse_i64)).collect();
                Column::new(name.as_str().into(), values)
            }
            Some(ColumnType::Numeric) => {
                let values: Vec<Option<f64>> =
                    texts.iter().map(|text| text.and_then(parse_f64)).collect();
                Column::new(name.as_str().into(), values)
            }
            _ => Column::new(name.as_str().into(), texts),
        };
        columns.push(column);
    }
    Ok(DataFrame::new(columns)?)
}

/// Frame holding the first `rows` rows of `table`.
pub fn preview_frame(table: &Table, rows: usize) -> Result<DataFrame> {
    let head: Vec<usize> = (0..table.height().min(rows)).collect();
    frame_from_table(&table.take(&head))
}

#[cfg(test)]
mod tests {
    use polars::prelude::DataType;

    use super::*;

    #[test]
    fn numeric_columns_get_numeric_dtypes() {
        let table = Table::from_strings(
            &["id", "amount", "city"],
            &[&["1", "1.5", "x"], &["2", "", "y"]],
        )
        .unwrap();
        let df = frame_from_table(&table).unwrap();
        assert_eq!(df.column("id").unwrap().dtype(), &DataType::Int64);
        let amount = df.column("amount").unwrap().f64().unwrap();
        assert_eq!(amount.get(0), Some(1.5));
        assert_eq!(amount.get(1), None);
        let city = df.column("city").unwrap().str().unwrap();
        assert_eq!(city.get(1), Some("y"));
    }

    #[test]
    fn preview_is_capped_at_the_table_height() {
        let table = Table::from_strings(&["k"], &[&["a"], &["b"], &["c"]]).unwrap();
        assert_eq!(preview_frame(&table, 2).unwrap().height(), 2);
        assert_eq!(preview_frame(&table, 10).unwrap().height(), 3);
        assert_eq!(preview_frame(&table, 0).unwrap().height(), 0);
    }
}
