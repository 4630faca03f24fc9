//! Core domain types for comfyops.
//!
//! This crate owns the vocabulary shared by every other crate in the
//! workspace:
//! - `workflow` - job descriptions, handles, statuses and results for the
//!   ComfyUI execution client
//! - `weights` - categories, URL entries and outcome reports for the
//!   weight download manager
//! - `paths` - user path expansion and the canonical install locations
//!
//! No I/O beyond reading a job file and resolving paths happens here.

#![deny(unused_crate_dependencies)]

pub mod paths;
pub mod weights;
pub mod workflow;

// Re-export commonly used types for convenience
pub use paths::{PathError, ResolvedPaths};
pub use weights::{
    CategoryHint, CategorySource, DownloadError, DownloadOutcome, DownloadSummary, FetchError,
    InstallError, ModelCategory, OutcomeKind, WeightUrlEntry,
};
pub use workflow::{
    ExecutionError, ExecutionFailure, JobDescription, JobDescriptionError, JobHandle, JobResult,
    JobSnapshot, JobStatus, OutputArtifact,
};

// Silence unused dev-dependency warnings for integration-only test deps
#[cfg(test)]
use tempfile as _;
