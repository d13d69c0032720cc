//! Surrogate identifier coercion.

use crate::numbers::{parse_f64, parse_i64};

/// Coerce a raw identifier cell into an integer id.
///
/// Clean integers are taken as-is, integral floats such as `"12.0"` keep
/// their integer value, and anything else has its non-digit characters
/// stripped before parsing. Text that still does not parse yields `0`,
/// which callers treat as "no id yet".
///
/// # Examples
///
/// ```
/// use dcs_common::coerce_id;
///
/// assert_eq!(coerce_id("42"), 42);
/// assert_eq!(coerce_id("12.0"), 12);
/// assert_eq!(coerce_id("#A-0017"), 17);
/// assert_eq!(coerce_id("n/a"), 0);
/// ```
pub fn coerce_id(raw: &str) -> i64 {
    if let Some(value) = parse_i64(raw) {
        return value;
    }
    if let Some(value) = parse_f64(raw)
        && value.is_finite()
        && value.fract() == 0.0
        && value.abs() < i64::MAX as f64
    {
        return value as i64;
    }
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    digits.parse::<i64>().unwrap_or(0)
}
