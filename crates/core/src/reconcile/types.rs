//! Types for the reconciliation pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::searcher::SearchCandidate;

/// Errors that end a cycle without publishing.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The metadata provider returned nothing; the previous table stays.
    #[error("catalog fetch returned no records")]
    EmptyCatalog,

    /// The cycle task did not run to completion.
    #[error("cycle aborted: {0}")]
    Aborted(String),
}

impl PipelineError {
    /// Label used for the cycle result metric.
    pub fn metric_label(&self) -> &'static str {
        match self {
            PipelineError::EmptyCatalog => "empty_catalog",
            PipelineError::Aborted(_) => "failed",
        }
    }
}

/// What happened to one catalog record during a cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    /// No search key could be derived (missing date or studio).
    Unsearchable,
    /// The search call failed; nothing is stored for the record.
    SearchFailed,
    /// Searched successfully. Candidates may be empty.
    Reconciled(Vec<SearchCandidate>),
}

impl RecordOutcome {
    pub fn metric_label(&self) -> &'static str {
        match self {
            RecordOutcome::Unsearchable => "unsearchable",
            RecordOutcome::SearchFailed => "search_failed",
            RecordOutcome::Reconciled(c) if c.is_empty() => "no_match",
            RecordOutcome::Reconciled(_) => "matched",
        }
    }
}

/// Yield counts for one finished cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    /// Catalog records fetched (after truncation).
    pub fetched: usize,
    /// Records stored with at least one candidate.
    pub matched: usize,
    /// Records searched successfully with no surviving candidate.
    pub no_match: usize,
    /// Records skipped for lack of a search key.
    pub unsearchable: usize,
    /// Records whose search call failed.
    pub search_failed: usize,
    /// Records published to the store.
    pub stored: usize,
    pub duration_ms: u64,
    pub finished_at: Option<DateTime<Utc>>,
}

impl CycleReport {
    pub(crate) fn count(&mut self, outcome: &RecordOutcome) {
        match outcome {
            RecordOutcome::Unsearchable => self.unsearchable += 1,
            RecordOutcome::SearchFailed => self.search_failed += 1,
            RecordOutcome::Reconciled(c) if c.is_empty() => self.no_match += 1,
            RecordOutcome::Reconciled(_) => self.matched += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts_outcomes() {
        let mut report = CycleReport::default();
        report.count(&RecordOutcome::Unsearchable);
        report.count(&RecordOutcome::SearchFailed);
        report.count(&RecordOutcome::Reconciled(vec![]));
        report.count(&RecordOutcome::Reconciled(vec![SearchCandidate {
            url: "https://dl/a".to_string(),
            filename: None,
            resolution: 720,
            codec: None,
            size_bytes: None,
            size_formatted: None,
            duration_secs: None,
        }]));

        assert_eq!(report.unsearchable, 1);
        assert_eq!(report.search_failed, 1);
        assert_eq!(report.no_match, 1);
        assert_eq!(report.matched, 1);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            PipelineError::EmptyCatalog.to_string(),
            "catalog fetch returned no records"
        );
        assert_eq!(
            PipelineError::Aborted("panicked".to_string()).to_string(),
            "cycle aborted: panicked"
        );
    }
}
