//! Caller-supplied operation parameters.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Pad `flags` with `false` or truncate it so it has exactly `len` entries.
pub fn reconcile_flags(flags: &[bool], len: usize) -> Vec<bool> {
    let mut reconciled: Vec<bool> = flags.iter().copied().take(len).collect();
    reconciled.resize(len, false);
    reconciled
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub column: String,
    pub ascending: bool,
}

/// Ordered sort columns with per-column direction flags.
///
/// Missing direction flags default to descending and surplus flags are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub ascending: Vec<bool>,
}

impl SortSpec {
    pub fn new(columns: Vec<String>, ascending: Vec<bool>) -> Self {
        Self { columns, ascending }
    }

    /// Every column in the same direction.
    pub fn uniform(columns: Vec<String>, ascending: bool) -> Self {
        let flags = vec![ascending; columns.len()];
        Self::new(columns, flags)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn flags(&self) -> Vec<bool> {
        reconcile_flags(&self.ascending, self.columns.len())
    }

    pub fn keys(&self) -> Vec<SortKey> {
        self.columns
            .iter()
            .zip(self.flags())
            .map(|(column, ascending)| SortKey {
                column: column.clone(),
                ascending,
            })
            .collect()
    }

    /// Same columns with every direction flipped (after reconciliation).
    pub fn reversed(&self) -> Self {
        Self::new(
            self.columns.clone(),
            self.flags().into_iter().map(|flag| !flag).collect(),
        )
    }

    /// Copy with the flag list reconciled to the column count.
    pub fn reconciled(&self) -> Self {
        Self::new(self.columns.clone(), self.flags())
    }
}

/// Suppression-column to primary-column name translation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMap(BTreeMap<String, String>);

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.0.insert(from.into(), to.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    /// Primary-side column names, in map order.
    pub fn target_columns(&self) -> Vec<String> {
        self.0.values().cloned().collect()
    }

    /// Split into well-formed entries and entries with a blank side.
    pub fn partition_malformed(&self) -> (Self, Vec<(String, String)>) {
        let mut valid = Self::new();
        let mut malformed = Vec::new();
        for (from, to) in &self.0 {
            let (from_trimmed, to_trimmed) = (from.trim(), to.trim());
            if from_trimmed.is_empty() || to_trimmed.is_empty() {
                malformed.push((from.clone(), to.clone()));
            } else {
                valid.insert(from_trimmed, to_trimmed);
            }
        }
        (valid, malformed)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(from, to)| (from.into(), to.into()))
                .collect(),
        )
    }
}

/// How a table is cut into exported files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitSpec {
    #[serde(default)]
    pub split_on: Vec<String>,
    #[serde(default)]
    pub fields: Option<Vec<String>>,
    #[serde(default)]
    pub dropna: bool,
    #[serde(default)]
    pub dest_dir: Option<PathBuf>,
    #[serde(default)]
    pub chunk_size: Option<usize>,
}

impl SplitSpec {
    pub fn new(split_on: Vec<String>) -> Self {
        Self {
            split_on,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = Some(fields);
        self
    }

    #[must_use]
    pub fn with_dropna(mut self, dropna: bool) -> Self {
        self.dropna = dropna;
        self
    }

    #[must_use]
    pub fn with_dest_dir(mut self, dest_dir: impl Into<PathBuf>) -> Self {
        self.dest_dir = Some(dest_dir.into());
        self
    }

    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size);
        self
    }
}

/// Options for overlaying one table's fields onto another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatherOptions {
    /// Column (or index name) both tables are matched on; the row index when unset.
    #[serde(default)]
    pub index_label: Option<String>,
    /// Source columns to overlay; all source columns when unset.
    #[serde(default)]
    pub fields: Option<Vec<String>>,
    /// Append source rows with no match in the target.
    #[serde(default = "default_append_missing")]
    pub append_missing: bool,
}

fn default_append_missing() -> bool {
    true
}

impl Default for GatherOptions {
    fn default() -> Self {
        Self {
            index_label: None,
            fields: None,
            append_missing: true,
        }
    }
}

impl GatherOptions {
    #[must_use]
    pub fn keyed_on(mut self, label: impl Into<String>) -> Self {
        self.index_label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = Some(fields);
        self
    }

    #[must_use]
    pub fn with_append_missing(mut self, append: bool) -> Self {
        self.append_missing = append;
        self
    }
}
