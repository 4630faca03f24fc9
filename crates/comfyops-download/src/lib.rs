//! Weight download manager for comfyops.
//!
//! Places model weight files under `<base>/models/<category>/<filename>`:
//! - `input` - normalizes raw URL lines (comments, blanks, per-line category)
//! - `resolver` - keyword heuristic mapping a URL to a category
//! - `strategy` - byte transfer, either the external parallel tool (`pget`)
//!   or the builtin sequential HTTP fetch
//! - `manager` - orchestration: plan, skip-if-exists, select a strategy,
//!   fetch, report one outcome per input line

#![deny(unused_crate_dependencies)]

// Re-export core types for convenience
pub use comfyops_core::weights::{
    CategoryHint, CategorySource, DownloadError, DownloadOutcome, DownloadSummary, FetchError,
    InstallError, ModelCategory, OutcomeKind, WeightUrlEntry,
};

mod input;
mod manager;
mod progress;
mod resolver;
pub mod strategy;

pub use input::{ParsedLine, normalize_input};
pub use manager::{
    DEFAULT_FILENAME, DownloadOptions, PlannedEntry, WeightDownloadManager, filename_from_url,
    plan_entries, validate_url,
};
pub use progress::{ProgressCallback, ProgressThrottle};
pub use resolver::DestinationResolver;
pub use strategy::{
    BuiltinSequentialFetch, ExternalParallelFetch, FetchJob, FetchStrategy, InstallerConfig,
    ToolInstaller, ToolSource,
};

// Silence unused dev-dependency warnings
#[cfg(test)]
use axum as _;
#[cfg(test)]
use tokio_test as _;
