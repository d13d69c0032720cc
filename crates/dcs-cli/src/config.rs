//! Job file loading and flag overrides.
//!
//! Job files are TOML. Relative paths inside a job file are resolved
//! against the directory holding the job file, so a job can be run from
//! anywhere. Flags given on the command line replace the matching job
//! values; list flags replace the job list when they are non-empty.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::de::DeserializeOwned;

use dcs_model::{
    CsvOptions, FieldMap, MergeEntry, MergePurgeJob, SortSpec, SplitJob, SplitSpec, SuppressEntry,
};

/// Parse a `FROM=TO` field-map flag value.
pub fn parse_field_map_entry(raw: &str) -> std::result::Result<(String, String), String> {
    let Some((from, to)) = raw.split_once('=') else {
        return Err(format!("expected FROM=TO, got '{raw}'"));
    };
    let (from, to) = (from.trim(), to.trim());
    if from.is_empty() || to.is_empty() {
        return Err(format!("both sides of '{raw}' must name a column"));
    }
    Ok((from.to_string(), to.to_string()))
}

/// `{stem}{suffix}.{ext}` beside `path`.
pub fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}{suffix}"),
    };
    path.with_file_name(name)
}

fn read_job<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read job file {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parse job file {}", path.display()))
}

fn base_dir(job_file: &Path) -> PathBuf {
    job_file
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Load a merge-purge job, resolving its paths against the job file's directory.
pub fn load_merge_purge_job(path: &Path) -> Result<MergePurgeJob> {
    let mut job: MergePurgeJob = read_job(path)?;
    let base = base_dir(path);
    job.primary = resolve(&base, &job.primary);
    job.output = resolve(&base, &job.output);
    for entry in &mut job.merge {
        entry.path = resolve(&base, &entry.path);
    }
    for entry in &mut job.suppress {
        entry.path = resolve(&base, &entry.path);
    }
    Ok(job)
}

/// Load a split job, resolving its paths against the job file's directory.
pub fn load_split_job(path: &Path) -> Result<SplitJob> {
    let mut job: SplitJob = read_job(path)?;
    let base = base_dir(path);
    job.input = resolve(&base, &job.input);
    if let Some(dir) = &job.spec.dest_dir {
        job.spec.dest_dir = Some(resolve(&base, dir));
    }
    Ok(job)
}

/// Merge-purge values supplied as flags.
#[derive(Debug, Clone, Default)]
pub struct MergePurgeOverrides {
    pub primary: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub merge: Vec<PathBuf>,
    pub suppress: Vec<PathBuf>,
    pub field_map: Vec<(String, String)>,
    pub dedupe_on: Vec<String>,
    pub sort: Vec<String>,
    pub ascending: Vec<bool>,
    pub delimiter: Option<char>,
}

/// Combine an optional job file with flag overrides into one job.
pub fn resolve_merge_purge_job(
    job_file: Option<&Path>,
    overrides: MergePurgeOverrides,
) -> Result<MergePurgeJob> {
    let job = job_file.map(load_merge_purge_job).transpose()?;
    let primary = match (overrides.primary, &job) {
        (Some(primary), _) => primary,
        (None, Some(job)) => job.primary.clone(),
        (None, None) => bail!("merge-purge needs --primary or a --job file"),
    };
    let output = match (overrides.output, &job) {
        (Some(output), _) => output,
        (None, Some(job)) => job.output.clone(),
        (None, None) => bail!("merge-purge needs --output or a --job file"),
    };
    let mut resolved = job.unwrap_or_else(|| MergePurgeJob {
        primary: PathBuf::new(),
        output: PathBuf::new(),
        dedupe_on: Vec::new(),
        sort: SortSpec::default(),
        merge: Vec::new(),
        suppress: Vec::new(),
        csv: CsvOptions::default(),
    });
    resolved.primary = primary;
    resolved.output = output;
    if !overrides.merge.is_empty() {
        resolved.merge = overrides
            .merge
            .into_iter()
            .map(|path| MergeEntry { path })
            .collect();
    }
    if !overrides.suppress.is_empty() {
        let field_map = (!overrides.field_map.is_empty())
            .then(|| overrides.field_map.into_iter().collect::<FieldMap>());
        resolved.suppress = overrides
            .suppress
            .into_iter()
            .map(|path| SuppressEntry {
                path,
                field_map: field_map.clone(),
            })
            .collect();
    } else if !overrides.field_map.is_empty() {
        bail!("--field-map applies to --suppress files; none were given");
    }
    if !overrides.dedupe_on.is_empty() {
        resolved.dedupe_on = overrides.dedupe_on;
    }
    if !overrides.sort.is_empty() {
        resolved.sort = SortSpec::new(overrides.sort, overrides.ascending);
    } else if !overrides.ascending.is_empty() {
        resolved.sort.ascending = overrides.ascending;
    }
    if overrides.delimiter.is_some() {
        resolved.csv.delimiter = overrides.delimiter;
    }
    Ok(resolved)
}

/// Split values supplied as flags.
#[derive(Debug, Clone, Default)]
pub struct SplitOverrides {
    pub input: Option<PathBuf>,
    pub split_on: Vec<String>,
    pub fields: Option<Vec<String>>,
    pub dropna: bool,
    pub dest_dir: Option<PathBuf>,
    pub chunk_size: Option<usize>,
    pub delimiter: Option<char>,
}

/// Combine an optional split job file with flag overrides into one job.
pub fn resolve_split_job(job_file: Option<&Path>, overrides: SplitOverrides) -> Result<SplitJob> {
    let job = job_file.map(load_split_job).transpose()?;
    let input = match (overrides.input, &job) {
        (Some(input), _) => input,
        (None, Some(job)) => job.input.clone(),
        (None, None) => bail!("split needs an INPUT file or a --job file"),
    };
    let mut resolved = job.unwrap_or_else(|| SplitJob {
        input: PathBuf::new(),
        spec: SplitSpec::default(),
        csv: CsvOptions::default(),
    });
    resolved.input = input;
    if !overrides.split_on.is_empty() {
        resolved.spec.split_on = overrides.split_on;
    }
    if overrides.fields.is_some() {
        resolved.spec.fields = overrides.fields;
    }
    resolved.spec.dropna |= overrides.dropna;
    if overrides.dest_dir.is_some() {
        resolved.spec.dest_dir = overrides.dest_dir;
    }
    if overrides.chunk_size.is_some() {
        resolved.spec.chunk_size = overrides.chunk_size;
    }
    if overrides.delimiter.is_some() {
        resolved.csv.delimiter = overrides.delimiter;
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_map_flags_need_both_sides() {
        assert_eq!(
            parse_field_map_entry("email_addr = email"),
            Ok(("email_addr".to_string(), "email".to_string()))
        );
        assert!(parse_field_map_entry("email").is_err());
        assert!(parse_field_map_entry("=email").is_err());
    }

    #[test]
    fn sibling_paths_keep_the_extension() {
        assert_eq!(
            sibling_path(Path::new("data/people.tsv"), "_kept"),
            PathBuf::from("data/people_kept.tsv")
        );
        assert_eq!(
            sibling_path(Path::new("people"), "_ids"),
            PathBuf::from("people_ids")
        );
    }

    #[test]
    fn flags_alone_build_a_job() {
        let overrides = MergePurgeOverrides {
            primary: Some("a.csv".into()),
            output: Some("b.csv".into()),
            suppress: vec!["dnc.csv".into()],
            field_map: vec![("phone".into(), "phone_number".into())],
            sort: vec!["updated".into()],
            ..MergePurgeOverrides::default()
        };
        let job = resolve_merge_purge_job(None, overrides).expect("job");
        assert_eq!(job.primary, PathBuf::from("a.csv"));
        assert_eq!(job.sort.flags(), vec![false]);
        let map = job.suppress[0].field_map.as_ref().expect("field map");
        assert_eq!(map.target_columns(), vec!["phone_number".to_string()]);
    }

    #[test]
    fn missing_primary_is_reported() {
        let overrides = MergePurgeOverrides {
            output: Some("b.csv".into()),
            ..MergePurgeOverrides::default()
        };
        let err = resolve_merge_purge_job(None, overrides).expect_err("no primary");
        assert!(err.to_string().contains("--primary"));
    }

    #[test]
    fn field_map_without_suppress_is_rejected() {
        let overrides = MergePurgeOverrides {
            primary: Some("a.csv".into()),
            output: Some("b.csv".into()),
            field_map: vec![("a".into(), "b".into())],
            ..MergePurgeOverrides::default()
        };
        assert!(resolve_merge_purge_job(None, overrides).is_err());
    }
}
