//! External parallel fetch through `pget multifile`.
//!
//! The whole batch is written to a manifest of `<url> <temp path>` lines and
//! handed to one tool process. The tool parallelizes the transfers; this
//! side only blocks on the process and reconciles the temp files afterwards.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use comfyops_core::weights::FetchError;
use thiserror::Error;
use tokio::process::Command;

use super::{BatchResult, FetchJob, FetchStrategy};

// ============================================================================
// Error Types
// ============================================================================

/// Failures of the tool process as a whole.
#[derive(Error, Debug)]
enum ToolRunError {
    #[error("Failed to write manifest: {0}")]
    Manifest(String),

    #[error("Failed to spawn {}: {reason}", .binary.display())]
    Spawn { binary: PathBuf, reason: String },

    #[error("pget exited with {status}: {stderr}")]
    Exited { status: String, stderr: String },
}

impl From<ToolRunError> for FetchError {
    fn from(err: ToolRunError) -> Self {
        Self::external(err.to_string())
    }
}

// ============================================================================
// Strategy
// ============================================================================

/// Delegates a batch to the external `pget` binary.
pub struct ExternalParallelFetch {
    binary: PathBuf,
}

impl ExternalParallelFetch {
    pub const fn new(binary: PathBuf) -> Self {
        Self { binary }
    }

    pub const fn binary(&self) -> &PathBuf {
        &self.binary
    }

    /// Write `<url> <temp path>` lines, with temp paths relative to `root`.
    fn write_manifest(
        root: &Path,
        jobs: &[FetchJob],
    ) -> Result<tempfile::NamedTempFile, ToolRunError> {
        let mut manifest = tempfile::Builder::new()
            .prefix("comfyops-manifest-")
            .suffix(".txt")
            .tempfile()
            .map_err(|e| ToolRunError::Manifest(e.to_string()))?;

        for job in jobs {
            let tmp = job.temp_path();
            let listed = tmp.strip_prefix(root).unwrap_or(tmp.as_path());
            if listed.to_string_lossy().chars().any(char::is_whitespace) {
                return Err(ToolRunError::Manifest(format!(
                    "{} contains whitespace",
                    listed.display()
                )));
            }
            writeln!(manifest, "{} {}", job.url, listed.display())
                .map_err(|e| ToolRunError::Manifest(e.to_string()))?;
        }
        manifest
            .flush()
            .map_err(|e| ToolRunError::Manifest(e.to_string()))?;

        Ok(manifest)
    }

    async fn run_tool(&self, jobs: &[FetchJob]) -> Result<(), ToolRunError> {
        let root = manifest_root(jobs);
        let manifest = Self::write_manifest(&root, jobs)?;

        let mut command = Command::new(&self.binary);
        command
            .arg("multifile")
            .arg(manifest.path())
            .arg("-f")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if !root.as_os_str().is_empty() {
            command.current_dir(&root);
        }

        let output = command.output().await.map_err(|e| ToolRunError::Spawn {
            binary: self.binary.clone(),
            reason: e.to_string(),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(ToolRunError::Exited {
                status: output.status.to_string(),
                stderr: if stderr.is_empty() {
                    "no output".to_string()
                } else {
                    stderr
                },
            });
        }

        Ok(())
    }
}

#[async_trait]
impl FetchStrategy for ExternalParallelFetch {
    fn name(&self) -> &'static str {
        "pget"
    }

    async fn fetch(&self, job: &FetchJob) -> Result<(), FetchError> {
        self.fetch_batch(std::slice::from_ref(job))
            .await?
            .into_iter()
            .next()
            .unwrap_or(Ok(()))
    }

    async fn fetch_batch(&self, jobs: &[FetchJob]) -> Result<BatchResult, FetchError> {
        if jobs.is_empty() {
            return Ok(Vec::new());
        }

        tracing::info!(count = jobs.len(), binary = %self.binary.display(), "Running pget multifile");

        // A leftover from an interrupted run must not pass for this run's output.
        for job in jobs {
            clear_stale(&job.temp_path()).await?;
        }

        if let Err(e) = self.run_tool(jobs).await {
            tracing::warn!(error = %e, "pget batch failed");
            for job in jobs {
                let _ = tokio::fs::remove_file(job.temp_path()).await;
            }
            return Err(e.into());
        }

        let mut results = Vec::with_capacity(jobs.len());
        for job in jobs {
            results.push(finalize(job).await);
        }
        Ok(results)
    }
}

/// Deepest directory holding every temp file. The tool runs there so the
/// manifest lists short relative paths.
fn manifest_root(jobs: &[FetchJob]) -> PathBuf {
    let mut dirs = jobs.iter().filter_map(|job| job.destination.parent());
    let Some(first) = dirs.next() else {
        return PathBuf::new();
    };

    let mut root = first.to_path_buf();
    for dir in dirs {
        while !dir.starts_with(&root) {
            if !root.pop() {
                break;
            }
        }
    }
    root
}

async fn clear_stale(tmp: &Path) -> Result<(), FetchError> {
    match tokio::fs::remove_file(tmp).await {
        Ok(()) => {
            tracing::debug!(path = %tmp.display(), "Removed stale partial file");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(FetchError::external(format!(
            "cannot clear {}: {e}",
            tmp.display()
        ))),
    }
}

/// Move a completed temp file onto the destination.
async fn finalize(job: &FetchJob) -> Result<(), FetchError> {
    let tmp = job.temp_path();
    if !tokio::fs::try_exists(&tmp).await.unwrap_or(false) {
        return Err(FetchError::IncompleteTransfer {
            path: job.destination.clone(),
        });
    }

    tokio::fs::rename(&tmp, &job.destination)
        .await
        .map_err(|e| FetchError::from_io_error(&e))
}
