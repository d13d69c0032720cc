//! Shared utilities for the data cleaning studio crates.
//!
//! Value-level helpers every other crate leans on: lenient number parsing,
//! identifier coercion from dirty text, and file-name token sanitisation.

pub mod ids;
pub mod numbers;
pub mod text;

pub use ids::coerce_id;
pub use numbers::{parse_f64, parse_i64};
pub use text::sanitize_token;
