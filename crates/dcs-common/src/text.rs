//! File-name token sanitisation.

/// Sanitize free text into a lower-case file-name token.
///
/// Keeps ASCII alphanumerics and underscores, collapses every run of other
/// characters into a single underscore, and trims underscores at both ends.
///
/// # Examples
///
/// ```
/// use dcs_common::sanitize_token;
///
/// assert_eq!(sanitize_token("New York"), "new_york");
/// assert_eq!(sanitize_token("  A&B -- C "), "a_b_c");
/// assert_eq!(sanitize_token("state_code"), "state_code");
/// ```
pub fn sanitize_token(raw: &str) -> String {
    let mut safe = String::with_capacity(raw.len());
    let mut last_was_underscore = true;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            safe.push(ch.to_ascii_lowercase());
            last_was_underscore = false;
        } else if !last_was_underscore {
            safe.push('_');
            last_was_underscore = true;
        }
    }
    while safe.ends_with('_') {
        safe.pop();
    }
    safe
}
