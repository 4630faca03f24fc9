//! Job descriptions and handles.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A caller-supplied job graph, forwarded to the server verbatim.
///
/// The client never looks inside the document; it is a single
/// submission unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobDescription(serde_json::Value);

/// Errors raised while loading a job description from disk.
#[derive(Debug, Error)]
pub enum JobDescriptionError {
    /// The file could not be read.
    #[error("Failed to read workflow {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    /// The file is not valid JSON.
    #[error("Workflow {path} is not valid JSON: {reason}")]
    Parse { path: PathBuf, reason: String },
}

impl JobDescription {
    /// Wrap an already-parsed JSON document.
    pub const fn new(document: serde_json::Value) -> Self {
        Self(document)
    }

    /// Load a job description from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self, JobDescriptionError> {
        let content = fs::read_to_string(path).map_err(|e| JobDescriptionError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        serde_json::from_str(&content)
            .map(Self)
            .map_err(|e| JobDescriptionError::Parse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }

    /// The underlying document.
    pub const fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

impl From<serde_json::Value> for JobDescription {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// Opaque server-assigned job identifier.
///
/// Created by a successful submission and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobHandle {
    job_id: String,
}

impl JobHandle {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.job_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn description_serializes_transparently() {
        let doc = json!({"3": {"class_type": "KSampler", "inputs": {"seed": 7}}});
        let job = JobDescription::new(doc.clone());

        assert_eq!(serde_json::to_value(&job).unwrap(), doc);
        assert_eq!(job.as_value(), &doc);
    }

    #[test]
    fn missing_file_reports_read_error() {
        let err = JobDescription::from_path(Path::new("/nonexistent/workflow.json")).unwrap_err();
        assert!(matches!(err, JobDescriptionError::Read { .. }));
        assert!(err.to_string().contains("/nonexistent/workflow.json"));
    }

    #[test]
    fn handle_displays_job_id() {
        let handle = JobHandle::new("abc-123");
        assert_eq!(handle.job_id(), "abc-123");
        assert_eq!(handle.to_string(), "abc-123");
    }
}
