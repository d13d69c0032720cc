//! Lenient number parsing for text cells.

/// Trimmed `f64`, or `None` when the cell is blank or not a number.
pub fn parse_f64(value: &str) -> Option<f64> {
    match value.trim() {
        "" => None,
        trimmed => trimmed.parse().ok(),
    }
}

/// Trimmed `i64`, or `None` when the cell is blank, fractional or out of range.
pub fn parse_i64(value: &str) -> Option<i64> {
    match value.trim() {
        "" => None,
        trimmed => trimmed.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(parse_f64("  2.5 "), Some(2.5));
        assert_eq!(parse_i64("\t-100 "), Some(-100));
    }

    #[test]
    fn blanks_and_junk_are_not_numbers() {
        assert_eq!(parse_f64("   "), None);
        assert_eq!(parse_f64("1,5"), None);
        assert_eq!(parse_i64("1.5"), None);
        assert_eq!(parse_i64("99999999999999999999"), None);
    }
}
