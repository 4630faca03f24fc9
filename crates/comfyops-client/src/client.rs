//! Submit-and-poll state machine.

use std::time::Duration;

use comfyops_core::{ExecutionError, JobDescription, JobHandle, JobResult};
use tokio::time::Instant;

use crate::backend::{ComfyHttpBackend, WorkflowBackend};
use crate::config::ClientConfig;

/// Lower bound on the poll interval so a zero interval cannot spin.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

// ============================================================================
// Type Aliases
// ============================================================================

/// Default client using the ComfyUI HTTP backend.
pub type DefaultWorkflowClient = WorkflowExecutionClient<ComfyHttpBackend>;

// ============================================================================
// Client
// ============================================================================

/// Submits jobs and waits for their terminal state.
///
/// Generic over the backend so the polling logic can be tested without a
/// server. Use [`DefaultWorkflowClient`] in production code.
///
/// Callers must not run `await_completion` concurrently for the same handle.
pub struct WorkflowExecutionClient<B: WorkflowBackend> {
    backend: B,
    max_poll_retries: u32,
}

impl DefaultWorkflowClient {
    /// Create a client for the configured ComfyUI instance.
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_backend(ComfyHttpBackend::new(config), config.max_poll_retries)
    }
}

impl<B: WorkflowBackend> WorkflowExecutionClient<B> {
    /// Create a client with a custom backend.
    pub const fn with_backend(backend: B, max_poll_retries: u32) -> Self {
        Self {
            backend,
            max_poll_retries,
        }
    }

    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Submit a job for execution.
    ///
    /// Fails with `Connection` when the server is unreachable and with
    /// `Rejected` when it refuses the document.
    pub async fn submit(&self, job: &JobDescription) -> Result<JobHandle, ExecutionError> {
        let handle = self.backend.submit(job).await?;
        tracing::info!(job_id = %handle, "Workflow submitted");
        Ok(handle)
    }

    /// Poll until the job reaches a terminal state or `timeout` elapses.
    ///
    /// Transient poll failures are tolerated up to the configured retry
    /// count; the counter resets after every successful poll. A timeout
    /// does not cancel the job server-side.
    pub async fn await_completion(
        &self,
        handle: &JobHandle,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<JobResult, ExecutionError> {
        let poll_interval = poll_interval.max(MIN_POLL_INTERVAL);
        let started = Instant::now();
        let deadline = started + timeout;
        let mut consecutive_failures = 0u32;

        loop {
            let now = Instant::now();
            if now >= deadline {
                return Err(Self::timed_out(handle, started));
            }

            let Ok(polled) = tokio::time::timeout(deadline - now, self.backend.poll(handle)).await
            else {
                return Err(Self::timed_out(handle, started));
            };

            match polled {
                Ok(snapshot) => {
                    consecutive_failures = 0;
                    tracing::debug!(job_id = %handle, status = %snapshot.status, "Polled job");

                    if let Some(result) = snapshot.into_result() {
                        tracing::info!(
                            job_id = %handle,
                            status = %result.status(),
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "Job reached terminal state",
                        );
                        return Ok(result);
                    }
                }
                Err(e) if e.is_transient() => {
                    consecutive_failures += 1;
                    if consecutive_failures > self.max_poll_retries {
                        tracing::warn!(
                            job_id = %handle,
                            error = %e,
                            attempts = consecutive_failures,
                            "Giving up after repeated poll failures",
                        );
                        return Err(e);
                    }
                    tracing::warn!(
                        job_id = %handle,
                        error = %e,
                        "Poll attempt {consecutive_failures} failed, retrying",
                    );
                }
                Err(e) => return Err(e),
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(Self::timed_out(handle, started));
            }
            tokio::time::sleep(poll_interval.min(deadline - now)).await;
        }
    }

    /// Submit a job and wait for its terminal state.
    pub async fn run(
        &self,
        job: &JobDescription,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<JobResult, ExecutionError> {
        let handle = self.submit(job).await?;
        self.await_completion(&handle, poll_interval, timeout).await
    }

    fn timed_out(handle: &JobHandle, started: Instant) -> ExecutionError {
        let waited = started.elapsed();
        tracing::warn!(
            job_id = %handle,
            waited_ms = waited.as_millis() as u64,
            "Timed out waiting for job; it may still be running",
        );
        ExecutionError::Timeout {
            job_id: handle.job_id().to_string(),
            waited,
        }
    }
}
