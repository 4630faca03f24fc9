//! Decoding of ComfyUI response bodies.
//!
//! Pure functions over `serde_json::Value` so the wire contract can be
//! tested without a server.

use comfyops_core::{ExecutionError, ExecutionFailure, JobHandle, JobSnapshot, OutputArtifact};
use serde::Deserialize;
use serde_json::{Value, json};

/// Body returned by `POST /prompt` after queuing a workflow.
#[derive(Debug, Deserialize)]
struct SubmitResponse {
    prompt_id: Option<String>,
}

/// Body returned by `GET /queue`.
#[derive(Debug, Default, Deserialize)]
struct QueueResponse {
    #[serde(default)]
    queue_running: Vec<Vec<Value>>,
}

/// Extract the job handle from a `/prompt` response.
pub(crate) fn parse_submit(body: Value) -> Result<JobHandle, ExecutionError> {
    let raw = body.to_string();
    let response: SubmitResponse = serde_json::from_value(body)
        .map_err(|e| ExecutionError::invalid_response(format!("{e}: {raw}")))?;

    match response.prompt_id {
        Some(id) if !id.is_empty() => Ok(JobHandle::new(id)),
        _ => Err(ExecutionError::invalid_response(format!(
            "no prompt_id returned: {raw}"
        ))),
    }
}

/// Interpret a `/history/{id}` response.
///
/// Returns `None` while the server has no history item for the job (it is
/// queued or still executing).
pub(crate) fn parse_history(body: &Value, job_id: &str) -> Result<Option<JobSnapshot>, ExecutionError> {
    let Some(history) = body.as_object() else {
        return Err(ExecutionError::invalid_response(format!(
            "history is not an object: {body}"
        )));
    };

    let Some(item) = history.get(job_id) else {
        return Ok(None);
    };

    let status = item.get("status");
    let status_str = status
        .and_then(|s| s.get("status_str"))
        .and_then(Value::as_str);
    let completed = status
        .and_then(|s| s.get("completed"))
        .and_then(Value::as_bool)
        .unwrap_or(false);

    if status_str == Some("error") {
        let failure = status.and_then(extract_failure);
        return Ok(Some(JobSnapshot::failed(failure)));
    }

    if completed {
        return Ok(Some(JobSnapshot::completed(collect_artifacts(item))));
    }

    Ok(Some(JobSnapshot::running()))
}

/// Decide between queued and running from a `/queue` response.
pub(crate) fn parse_queue(body: Value, job_id: &str) -> JobSnapshot {
    let queue: QueueResponse = serde_json::from_value(body).unwrap_or_default();

    let running = queue
        .queue_running
        .iter()
        .any(|entry| entry.get(1).and_then(Value::as_str) == Some(job_id));

    if running {
        JobSnapshot::running()
    } else {
        JobSnapshot::queued()
    }
}

/// Decode an error body for diagnostics.
///
/// JSON bodies are passed through; anything else is wrapped as
/// `{"raw": "<text>"}`. An empty body becomes `null`.
pub(crate) fn decode_error_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| json!({ "raw": text }))
}

/// Collect every file record under `outputs`, in server order.
fn collect_artifacts(item: &Value) -> Vec<OutputArtifact> {
    let Some(outputs) = item.get("outputs").and_then(Value::as_object) else {
        return Vec::new();
    };

    outputs
        .values()
        .filter_map(Value::as_object)
        .flat_map(|node_output| node_output.values())
        .filter_map(Value::as_array)
        .flatten()
        .filter_map(artifact_from_value)
        .collect()
}

fn artifact_from_value(value: &Value) -> Option<OutputArtifact> {
    let record = value.as_object()?;
    let filename = record.get("filename")?.as_str()?;
    let subfolder = record.get("subfolder").and_then(Value::as_str).unwrap_or("");
    let kind = record.get("type").and_then(Value::as_str).unwrap_or("output");
    Some(OutputArtifact::new(filename, subfolder, kind))
}

/// Pull the last `execution_error` payload from `status.messages`.
fn extract_failure(status: &Value) -> Option<ExecutionFailure> {
    let messages = status.get("messages")?.as_array()?;

    messages.iter().rev().find_map(|msg| {
        let pair = msg.as_array()?;
        if pair.len() < 2 || pair[0].as_str() != Some("execution_error") {
            return None;
        }

        let detail = &pair[1];
        if !detail.is_object() {
            return Some(ExecutionFailure {
                exception_message: Some(stringify(detail)),
                ..ExecutionFailure::default()
            });
        }

        Some(ExecutionFailure {
            node_id: detail.get("node_id").map(stringify),
            node_type: detail.get("node_type").map(stringify),
            exception_type: detail.get("exception_type").map(stringify),
            exception_message: detail.get("exception_message").map(stringify),
        })
    })
}

/// Render a scalar as text without surrounding JSON quotes.
fn stringify(value: &Value) -> String {
    value
        .as_str()
        .map_or_else(|| value.to_string(), ToString::to_string)
}
