//! Column dtype inference.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use dcs_common::parse_f64;

use crate::table::CellValue;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Numeric,
    Timestamp,
    Text,
}

/// Parse a date or date-time in one of the supported layouts.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(parsed);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, format) {
            return parsed.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Infer a column dtype: numeric or timestamp only when every present value agrees.
pub fn infer_column_type<'a>(values: impl IntoIterator<Item = &'a CellValue>) -> ColumnType {
    let mut present = 0usize;
    let mut numeric = true;
    let mut timestamp = true;
    for value in values {
        let Some(text) = value.as_text() else {
            continue;
        };
        present += 1;
        if numeric && parse_f64(text).is_none() {
            numeric = false;
        }
        if timestamp && parse_timestamp(text).is_none() {
            timestamp = false;
        }
        if !numeric && !timestamp {
            return ColumnType::Text;
        }
    }
    if present == 0 {
        ColumnType::Text
    } else if numeric {
        ColumnType::Numeric
    } else if timestamp {
        ColumnType::Timestamp
    } else {
        ColumnType::Text
    }
}
