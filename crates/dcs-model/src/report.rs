//! Merge-purge execution report.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::specs::SortSpec;

/// Rows gained or lost because of one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceDelta {
    pub source: PathBuf,
    pub rows: usize,
}

impl SourceDelta {
    pub fn new(source: impl Into<PathBuf>, rows: usize) -> Self {
        Self {
            source: source.into(),
            rows,
        }
    }
}

/// Audit record of a single merge-purge run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionReport {
    pub primary: PathBuf,
    pub destination: Option<PathBuf>,
    pub original_rows: usize,
    pub final_rows: usize,
    pub merges: Vec<SourceDelta>,
    pub suppressions: Vec<SourceDelta>,
    pub sort: SortSpec,
    pub dedupe_on: Vec<String>,
    pub dedupe_lost: usize,
}

impl ExecutionReport {
    pub fn rows_gained(&self) -> usize {
        self.merges.iter().map(|delta| delta.rows).sum()
    }

    pub fn rows_suppressed(&self) -> usize {
        self.suppressions.iter().map(|delta| delta.rows).sum()
    }

    /// Row count implied by the recorded deltas.
    pub fn expected_final_rows(&self) -> usize {
        (self.original_rows + self.rows_gained())
            .saturating_sub(self.rows_suppressed())
            .saturating_sub(self.dedupe_lost)
    }

    /// Plain-text rendering persisted beside the export.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ExecutionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Merge-purge report")?;
        writeln!(f, "Primary: {}", self.primary.display())?;
        if let Some(destination) = &self.destination {
            writeln!(f, "Destination: {}", destination.display())?;
        }
        writeln!(f, "Original rows: {}", self.original_rows)?;
        writeln!(f, "Final rows: {}", self.final_rows)?;

        writeln!(f)?;
        writeln!(f, "[Merge]")?;
        for delta in &self.merges {
            writeln!(f, "Gained {} merging {}", delta.rows, delta.source.display())?;
        }

        writeln!(f)?;
        writeln!(f, "[Purge]")?;
        for delta in &self.suppressions {
            writeln!(f, "Lost {} suppressing {}", delta.rows, delta.source.display())?;
        }

        writeln!(f)?;
        writeln!(f, "[Sort]")?;
        writeln!(f, "Columns: {}", self.sort.columns.join(", "))?;
        let flags: Vec<String> = self.sort.flags().iter().map(bool::to_string).collect();
        writeln!(f, "Ascending: {}", flags.join(", "))?;

        writeln!(f)?;
        writeln!(f, "[Dedupe]")?;
        writeln!(f, "Key: {}", self.dedupe_on.join(", "))?;
        writeln!(f, "Lost {} deduplicating", self.dedupe_lost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> ExecutionReport {
        ExecutionReport {
            primary: "customers.csv".into(),
            destination: None,
            original_rows: 10,
            final_rows: 9,
            merges: vec![SourceDelta::new("extra.csv", 3)],
            suppressions: vec![SourceDelta::new("dnc.csv", 2), SourceDelta::new("bounced.csv", 1)],
            sort: SortSpec::new(vec!["updated".into()], vec![]),
            dedupe_on: vec!["email".into()],
            dedupe_lost: 1,
        }
    }

    #[test]
    fn conservation_matches_final_rows() {
        let report = report();
        assert_eq!(report.rows_gained(), 3);
        assert_eq!(report.rows_suppressed(), 3);
        assert_eq!(report.expected_final_rows(), report.final_rows);
    }

    #[test]
    fn sections_render_in_order() {
        let text = report().render();
        let merge = text.find("[Merge]").unwrap();
        let purge = text.find("[Purge]").unwrap();
        let sort = text.find("[Sort]").unwrap();
        let dedupe = text.find("[Dedupe]").unwrap();
        assert!(merge < purge && purge < sort && sort < dedupe);
        assert!(text.contains("Gained 3 merging extra.csv\n"));
        assert!(text.contains("Lost 2 suppressing dnc.csv\n"));
        assert!(text.contains("Ascending: false\n"));
        assert!(!text.contains("Destination:"));
    }
}
