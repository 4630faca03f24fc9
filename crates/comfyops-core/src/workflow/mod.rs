//! Workflow execution domain types.
//!
//! A job moves through `Queued -> Running -> Completed | Failed`. The
//! transitions are driven by the server; the client only observes them.

mod errors;
mod job;
mod status;

pub use errors::ExecutionError;
pub use job::{JobDescription, JobDescriptionError, JobHandle};
pub use status::{ExecutionFailure, JobResult, JobSnapshot, JobStatus, OutputArtifact};
