//! Job-level error taxonomy.

use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by job submission and polling.
///
/// Each variant is a single terminal error for the call that raised it.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The server could not be reached (refused, DNS, request timeout).
    ///
    /// Recoverable by retrying once the server is running.
    #[error("ComfyUI server unreachable at {url}: {message}")]
    Connection { url: String, message: String },

    /// The server answered with a non-success status.
    ///
    /// `body` is the decoded JSON body, or `{"raw": "<text>"}` when the body
    /// was not JSON.
    #[error("ComfyUI rejected the request ({status}): {body}")]
    Rejected {
        status: u16,
        body: serde_json::Value,
    },

    /// No terminal state was observed within the budget. The job may
    /// still be running server-side.
    #[error("Job {job_id} did not finish within {:.1}s", waited.as_secs_f64())]
    Timeout { job_id: String, waited: Duration },

    /// The server answered with a body that does not match the contract.
    #[error("Invalid response from ComfyUI: {message}")]
    InvalidResponse { message: String },
}

impl ExecutionError {
    pub fn connection(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// Whether a poll that failed this way may succeed on a later attempt.
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Connection { .. } => true,
            Self::Rejected { status, .. } => *status >= 500,
            Self::Timeout { .. } | Self::InvalidResponse { .. } => false,
        }
    }

    /// Stable machine-readable label used in CLI output.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Connection { .. } => "connection_error",
            Self::Rejected { .. } => "http_error",
            Self::Timeout { .. } => "timeout",
            Self::InvalidResponse { .. } => "invalid_response",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn transient_classification() {
        assert!(ExecutionError::connection("http://x", "refused").is_transient());
        assert!(
            ExecutionError::Rejected {
                status: 503,
                body: json!({}),
            }
            .is_transient()
        );
        assert!(
            !ExecutionError::Rejected {
                status: 400,
                body: json!({}),
            }
            .is_transient()
        );
        assert!(!ExecutionError::invalid_response("bad").is_transient());
    }

    #[test]
    fn timeout_message_mentions_job_and_budget() {
        let err = ExecutionError::Timeout {
            job_id: "p-1".to_string(),
            waited: Duration::from_secs(5),
        };
        let msg = err.to_string();
        assert!(msg.contains("p-1"));
        assert!(msg.contains("5.0s"));
    }

    #[test]
    fn rejected_message_includes_body() {
        let err = ExecutionError::Rejected {
            status: 400,
            body: json!({"error": {"type": "prompt_no_outputs"}}),
        };
        assert!(err.to_string().contains("prompt_no_outputs"));
        assert_eq!(err.kind(), "http_error");
    }
}
