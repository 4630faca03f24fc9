//! Server backend abstraction for workflow execution.
//!
//! The polling state machine depends only on [`WorkflowBackend`]. The
//! production implementation speaks the ComfyUI HTTP API via reqwest; tests
//! use the scripted backend in [`testing`].

use async_trait::async_trait;
use comfyops_core::{ExecutionError, JobDescription, JobHandle, JobSnapshot};
use serde_json::{Value, json};

use crate::config::ClientConfig;
use crate::parsing::{decode_error_body, parse_history, parse_queue, parse_submit};

// ============================================================================
// Backend Trait
// ============================================================================

/// Narrow port to a job-queue server.
#[async_trait]
pub trait WorkflowBackend: Send + Sync {
    /// Queue a job and return its handle.
    async fn submit(&self, job: &JobDescription) -> Result<JobHandle, ExecutionError>;

    /// Observe the current state of a job.
    async fn poll(&self, handle: &JobHandle) -> Result<JobSnapshot, ExecutionError>;
}

// ============================================================================
// ComfyUI HTTP Backend
// ============================================================================

/// HTTP backend for a single ComfyUI instance.
///
/// Wraps `POST /prompt`, `GET /history/{prompt_id}` and `GET /queue`.
pub struct ComfyHttpBackend {
    client: reqwest::Client,
    base_url: String,
    client_id: String,
}

impl ComfyHttpBackend {
    /// Create a backend for the configured instance.
    ///
    /// A fresh `client_id` (UUID v4) identifies this client to the server.
    pub fn new(config: &ClientConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });

        Self::with_client(client, config.base_url.clone())
    }

    /// Create a backend reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: String) -> Self {
        Self {
            client,
            base_url,
            client_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    async fn get_json(&self, path: &str) -> Result<Value, ExecutionError> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_send_error(&e))?;

        Self::parse_response(response).await
    }

    /// Map a transport error. Everything that prevents a response from
    /// arriving counts as the server being unreachable.
    fn map_send_error(&self, err: &reqwest::Error) -> ExecutionError {
        if err.is_decode() {
            return ExecutionError::invalid_response(err.to_string());
        }
        ExecutionError::connection(&self.base_url, err.to_string())
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code, passing the body of a
    /// rejection through for diagnostics.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ExecutionError> {
        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ExecutionError::Rejected {
                status: status.as_u16(),
                body: decode_error_body(&text),
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body.
    async fn parse_response(response: reqwest::Response) -> Result<Value, ExecutionError> {
        let response = Self::ensure_success(response).await?;
        response
            .json::<Value>()
            .await
            .map_err(|e| ExecutionError::invalid_response(e.to_string()))
    }
}

#[async_trait]
impl WorkflowBackend for ComfyHttpBackend {
    async fn submit(&self, job: &JobDescription) -> Result<JobHandle, ExecutionError> {
        let body = json!({
            "prompt": job.as_value(),
            "client_id": self.client_id,
        });

        let response = self
            .client
            .post(format!("{}/prompt", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(&e))?;

        let body = Self::parse_response(response).await?;
        parse_submit(body)
    }

    async fn poll(&self, handle: &JobHandle) -> Result<JobSnapshot, ExecutionError> {
        let history = self
            .get_json(&format!("/history/{}", handle.job_id()))
            .await?;

        if let Some(snapshot) = parse_history(&history, handle.job_id())? {
            return Ok(snapshot);
        }

        let queue = self.get_json("/queue").await?;
        Ok(parse_queue(queue, handle.job_id()))
    }
}

// ============================================================================
// Scripted Backend for Testing
// ============================================================================

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// A backend that replays a fixed script of poll responses.
    ///
    /// Once the script is exhausted every poll returns `fallback`.
    pub struct ScriptedBackend {
        submit_error: Mutex<Option<ExecutionError>>,
        polls: Mutex<VecDeque<Result<JobSnapshot, ExecutionError>>>,
        fallback: JobSnapshot,
        hang: bool,
        poll_count: AtomicUsize,
    }

    impl ScriptedBackend {
        pub fn new(polls: Vec<Result<JobSnapshot, ExecutionError>>) -> Self {
            Self {
                submit_error: Mutex::new(None),
                polls: Mutex::new(polls.into()),
                fallback: JobSnapshot::running(),
                hang: false,
                poll_count: AtomicUsize::new(0),
            }
        }

        /// A backend whose jobs never leave the running state.
        pub fn never_finishing() -> Self {
            Self::new(Vec::new())
        }

        /// A backend whose polls never return.
        pub fn hanging() -> Self {
            Self {
                hang: true,
                ..Self::never_finishing()
            }
        }

        pub fn with_submit_error(self, err: ExecutionError) -> Self {
            *self.submit_error.lock().unwrap() = Some(err);
            self
        }

        pub fn poll_count(&self) -> usize {
            self.poll_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WorkflowBackend for ScriptedBackend {
        async fn submit(&self, _job: &JobDescription) -> Result<JobHandle, ExecutionError> {
            match self.submit_error.lock().unwrap().take() {
                Some(err) => Err(err),
                None => Ok(JobHandle::new("scripted-1")),
            }
        }

        async fn poll(&self, _handle: &JobHandle) -> Result<JobSnapshot, ExecutionError> {
            self.poll_count.fetch_add(1, Ordering::SeqCst);
            if self.hang {
                std::future::pending::<()>().await;
            }
            let next = self.polls.lock().unwrap().pop_front();
            next.unwrap_or_else(|| Ok(self.fallback.clone()))
        }
    }
}
