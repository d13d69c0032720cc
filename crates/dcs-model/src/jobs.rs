//! Job files describing headless runs.
//!
//! Jobs are plain serde structs; the CLI loads them from TOML. Relative
//! paths are resolved by the loader, not here.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::options::CsvOptions;
use crate::specs::{FieldMap, SortSpec, SplitSpec};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MergeEntry {
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuppressEntry {
    pub path: PathBuf,
    #[serde(default)]
    pub field_map: Option<FieldMap>,
}

/// A complete merge-purge run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MergePurgeJob {
    pub primary: PathBuf,
    pub output: PathBuf,
    #[serde(default)]
    pub dedupe_on: Vec<String>,
    #[serde(default)]
    pub sort: SortSpec,
    #[serde(default)]
    pub merge: Vec<MergeEntry>,
    #[serde(default)]
    pub suppress: Vec<SuppressEntry>,
    #[serde(default)]
    pub csv: CsvOptions,
}

/// A split-to-files run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitJob {
    pub input: PathBuf,
    #[serde(flatten)]
    pub spec: SplitSpec,
    #[serde(default)]
    pub csv: CsvOptions,
}
