//! Output formatting for CLI commands.
//!
//! Format-only: every function here turns a library result into a line of
//! text or a JSON document and never decides exit status.

use comfyops_core::{
    DownloadOutcome, DownloadSummary, ExecutionError, ExecutionFailure, JobHandle,
    OutcomeKind, OutputArtifact,
};
use comfyops_download::PlannedEntry;
use serde_json::{Value, json};

// ============================================================================
// run
// ============================================================================

/// `{"prompt_id", "images": [{filename, subfolder, type}]}`
pub fn run_completed(handle: &JobHandle, artifacts: &[OutputArtifact]) -> Value {
    json!({
        "prompt_id": handle.job_id(),
        "images": artifacts,
    })
}

/// The server ran the job and reported an execution error.
pub fn run_failed(handle: &JobHandle, error: &str, detail: Option<&ExecutionFailure>) -> Value {
    let mut doc = json!({
        "error": "execution_error",
        "prompt_id": handle.job_id(),
        "message": error,
    });
    if let Some(detail) = detail {
        doc["detail"] = json!(detail);
    }
    doc
}

/// Submission or polling broke off before a terminal state.
///
/// `handle` is `None` when the submission itself failed.
pub fn run_error(handle: Option<&JobHandle>, err: &ExecutionError) -> Value {
    let mut doc = json!({
        "error": err.kind(),
        "message": err.to_string(),
    });
    if let Some(handle) = handle {
        doc["prompt_id"] = json!(handle.job_id());
    }
    if let ExecutionError::Rejected { status, body } = err {
        doc["status"] = json!(status);
        doc["body"] = body.clone();
    }
    doc
}

// ============================================================================
// download / resolve
// ============================================================================

/// One human-readable line per outcome.
pub fn outcome_line(outcome: &DownloadOutcome) -> String {
    let entry = &outcome.entry;
    match outcome.result {
        OutcomeKind::Downloaded => entry.local_path.display().to_string(),
        OutcomeKind::Skipped => format!("skipped {}", entry.local_path.display()),
        OutcomeKind::Failed => format!(
            "error {}: {}",
            entry.source_url,
            outcome.error.as_deref().unwrap_or("unknown error")
        ),
    }
}

/// Full machine-readable report.
pub fn download_report(outcomes: &[DownloadOutcome], summary: &DownloadSummary) -> Value {
    json!({
        "results": outcomes,
        "summary": summary,
    })
}

/// Dry-run line: category and destination, or why the entry is unusable.
pub fn plan_line(planned: &PlannedEntry) -> String {
    let entry = &planned.entry;
    match &planned.problem {
        Some(problem) => format!("error {}: {problem}", entry.source_url),
        None => format!("{}\t{}", entry.category, entry.local_path.display()),
    }
}
