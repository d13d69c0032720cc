//! Delimited-text options.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Options for reading and writing delimited text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvOptions {
    /// Field delimiter. Derived from the file extension when unset.
    #[serde(default)]
    pub delimiter: Option<char>,
}

impl CsvOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Delimiter byte to use for `path`.
    ///
    /// `.tsv` and `.tab` files default to tab, everything else to comma.
    /// Non-ASCII delimiters fall back to the extension default.
    pub fn delimiter_for(&self, path: &Path) -> u8 {
        let by_extension = match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("tsv" | "tab") => b'\t',
            _ => b',',
        };
        self.delimiter
            .and_then(|ch| u8::try_from(ch).ok())
            .unwrap_or(by_extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_defaults() {
        let options = CsvOptions::new();
        assert_eq!(options.delimiter_for(Path::new("a.csv")), b',');
        assert_eq!(options.delimiter_for(Path::new("a.TSV")), b'\t');
        assert_eq!(options.delimiter_for(Path::new("noext")), b',');
    }

    #[test]
    fn explicit_delimiter_wins() {
        let options = CsvOptions::new().with_delimiter('|');
        assert_eq!(options.delimiter_for(Path::new("a.tsv")), b'|');
    }
}
