//! Run command handler.
//!
//! Submits a workflow file and waits for it, printing exactly one JSON
//! document on stdout whatever the outcome.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use comfyops_core::{JobDescription, JobResult};
use serde_json::json;

use super::emit_json;
use crate::bootstrap;
use crate::error::CliError;
use crate::presentation;

/// Run command arguments passed from CLI.
pub struct RunArgs<'a> {
    pub workflow: &'a Path,
    pub host: &'a str,
    pub port: u16,
    pub poll: Duration,
    pub timeout: Duration,
}

/// Execute the run command.
pub async fn execute(args: RunArgs<'_>) -> Result<()> {
    let job = match JobDescription::from_path(args.workflow) {
        Ok(job) => job,
        Err(e) => {
            emit_json(&json!({"error": "invalid_workflow", "message": e.to_string()}))?;
            return Err(CliError::from(e).into());
        }
    };

    let client = bootstrap::workflow_client(args.host, args.port);

    let handle = match client.submit(&job).await {
        Ok(handle) => handle,
        Err(e) => {
            emit_json(&presentation::run_error(None, &e))?;
            return Err(CliError::from(e).into());
        }
    };

    match client.await_completion(&handle, args.poll, args.timeout).await {
        Ok(JobResult::Completed { artifacts }) => {
            emit_json(&presentation::run_completed(&handle, &artifacts))?;
            Ok(())
        }
        Ok(JobResult::Failed { error, detail }) => {
            emit_json(&presentation::run_failed(&handle, &error, detail.as_ref()))?;
            Err(CliError::Core(format!("Job {handle} failed: {error}")).into())
        }
        Err(e) => {
            emit_json(&presentation::run_error(Some(&handle), &e))?;
            Err(CliError::from(e).into())
        }
    }
}
