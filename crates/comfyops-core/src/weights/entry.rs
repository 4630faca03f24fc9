//! Per-URL entries and the outcome report.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use super::category::{CategorySource, ModelCategory};

/// One input URL with its resolved destination.
///
/// The category and local path are fixed when the entry is created and
/// never recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeightUrlEntry {
    #[serde(rename = "url")]
    pub source_url: String,
    pub category: ModelCategory,
    pub category_source: CategorySource,
    #[serde(rename = "path")]
    pub local_path: PathBuf,
}

/// What happened to one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeKind {
    Downloaded,
    Skipped,
    Failed,
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Downloaded => "downloaded",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        })
    }
}

/// Report line for one input URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadOutcome {
    #[serde(flatten)]
    pub entry: WeightUrlEntry,
    #[serde(rename = "outcome")]
    pub result: OutcomeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DownloadOutcome {
    pub const fn downloaded(entry: WeightUrlEntry) -> Self {
        Self {
            entry,
            result: OutcomeKind::Downloaded,
            error: None,
        }
    }

    pub const fn skipped(entry: WeightUrlEntry) -> Self {
        Self {
            entry,
            result: OutcomeKind::Skipped,
            error: None,
        }
    }

    pub fn failed(entry: WeightUrlEntry, error: impl fmt::Display) -> Self {
        Self {
            entry,
            result: OutcomeKind::Failed,
            error: Some(error.to_string()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.result == OutcomeKind::Failed
    }
}

/// Per-outcome counts for a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DownloadSummary {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl DownloadSummary {
    pub fn from_outcomes(outcomes: &[DownloadOutcome]) -> Self {
        outcomes
            .iter()
            .fold(Self::default(), |mut summary, outcome| {
                match outcome.result {
                    OutcomeKind::Downloaded => summary.downloaded += 1,
                    OutcomeKind::Skipped => summary.skipped += 1,
                    OutcomeKind::Failed => summary.failed += 1,
                }
                summary
            })
    }

    pub const fn has_failures(&self) -> bool {
        self.failed > 0
    }

    pub const fn total(&self) -> usize {
        self.downloaded + self.skipped + self.failed
    }
}

impl fmt::Display for DownloadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} downloaded, {} skipped, {} failed",
            self.downloaded, self.skipped, self.failed
        )
    }
}
