//! Job status, poll snapshots and terminal results.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Server-side lifecycle state of a submitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    /// Whether the job can no longer change state.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A produced file reference on the server's output storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputArtifact {
    pub filename: String,
    pub subfolder: String,
    /// Storage kind reported by the server (`output`, `temp`, ...).
    #[serde(rename = "type")]
    pub kind: String,
}

impl OutputArtifact {
    pub fn new(
        filename: impl Into<String>,
        subfolder: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            subfolder: subfolder.into(),
            kind: kind.into(),
        }
    }
}

/// Structured detail of a server-side execution error.
///
/// Every field is optional because the server only fills what it knows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionFailure {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception_message: Option<String>,
}

impl ExecutionFailure {
    /// One-line human readable description.
    pub fn summary(&self) -> String {
        let message = self
            .exception_message
            .as_deref()
            .map_or("execution failed", str::trim);

        let mut out = String::new();
        if let Some(node_id) = &self.node_id {
            out.push_str("node ");
            out.push_str(node_id);
            if let Some(node_type) = &self.node_type {
                out.push_str(" (");
                out.push_str(node_type);
                out.push(')');
            }
            out.push_str(": ");
        }
        if let Some(exception_type) = &self.exception_type {
            out.push_str(exception_type);
            out.push_str(": ");
        }
        out.push_str(message);
        out
    }
}

/// What a single poll observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSnapshot {
    pub status: JobStatus,
    /// Populated only when `status` is `Completed`.
    pub artifacts: Vec<OutputArtifact>,
    /// Populated only when `status` is `Failed`.
    pub failure: Option<ExecutionFailure>,
}

impl JobSnapshot {
    pub const fn queued() -> Self {
        Self {
            status: JobStatus::Queued,
            artifacts: Vec::new(),
            failure: None,
        }
    }

    pub const fn running() -> Self {
        Self {
            status: JobStatus::Running,
            artifacts: Vec::new(),
            failure: None,
        }
    }

    pub const fn completed(artifacts: Vec<OutputArtifact>) -> Self {
        Self {
            status: JobStatus::Completed,
            artifacts,
            failure: None,
        }
    }

    pub const fn failed(failure: Option<ExecutionFailure>) -> Self {
        Self {
            status: JobStatus::Failed,
            artifacts: Vec::new(),
            failure,
        }
    }

    /// Convert a terminal snapshot into a result; `None` while the job is
    /// still queued or running.
    pub fn into_result(self) -> Option<JobResult> {
        match self.status {
            JobStatus::Queued | JobStatus::Running => None,
            JobStatus::Completed => Some(JobResult::Completed {
                artifacts: self.artifacts,
            }),
            JobStatus::Failed => {
                let error = self
                    .failure
                    .as_ref()
                    .map_or_else(|| "execution failed".to_string(), ExecutionFailure::summary);
                Some(JobResult::Failed {
                    error,
                    detail: self.failure,
                })
            }
        }
    }
}

/// Terminal outcome of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JobResult {
    /// The job finished; artifacts are in server-reported order.
    Completed { artifacts: Vec<OutputArtifact> },
    /// The server reported an execution error.
    Failed {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        detail: Option<ExecutionFailure>,
    },
}

impl JobResult {
    pub const fn status(&self) -> JobStatus {
        match self {
            Self::Completed { .. } => JobStatus::Completed,
            Self::Failed { .. } => JobStatus::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn pending_snapshot_has_no_result() {
        assert!(JobSnapshot::queued().into_result().is_none());
        assert!(JobSnapshot::running().into_result().is_none());
    }

    #[test]
    fn completed_snapshot_keeps_artifact_order() {
        let artifacts = vec![
            OutputArtifact::new("b.png", "", "output"),
            OutputArtifact::new("a.png", "sub", "temp"),
        ];
        let result = JobSnapshot::completed(artifacts.clone()).into_result();

        assert_eq!(result, Some(JobResult::Completed { artifacts }));
    }

    #[test]
    fn failed_snapshot_without_detail_uses_generic_message() {
        let result = JobSnapshot::failed(None).into_result().unwrap();
        assert_eq!(
            result,
            JobResult::Failed {
                error: "execution failed".to_string(),
                detail: None,
            }
        );
    }

    #[test]
    fn failure_summary_includes_node_and_exception() {
        let failure = ExecutionFailure {
            node_id: Some("4".to_string()),
            node_type: Some("CheckpointLoaderSimple".to_string()),
            exception_type: Some("FileNotFoundError".to_string()),
            exception_message: Some("model.safetensors missing\n".to_string()),
        };

        assert_eq!(
            failure.summary(),
            "node 4 (CheckpointLoaderSimple): FileNotFoundError: model.safetensors missing"
        );
    }

    #[test]
    fn artifact_kind_serializes_as_type() {
        let artifact = OutputArtifact::new("img.png", "", "output");
        let json = serde_json::to_value(&artifact).unwrap();
        assert_eq!(json["type"], "output");
        assert!(json.get("kind").is_none());
    }

    #[test]
    fn result_serializes_with_status_tag() {
        let result = JobResult::Completed { artifacts: vec![] };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "completed");
    }
}
