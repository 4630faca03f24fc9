//! ComfyUI workflow execution client.
//!
//! Submits an API-format workflow to a running ComfyUI server, polls the
//! history endpoint until the job reaches a terminal state (or the timeout
//! elapses), and extracts the output artifact list.
//!
//! The polling state machine in [`WorkflowExecutionClient`] only talks to
//! the narrow [`WorkflowBackend`] port (`submit`, `poll`); the concrete HTTP
//! contract lives in [`ComfyHttpBackend`].

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

mod backend;
mod client;
mod config;
mod parsing;

// ============================================================================
// Public API
// ============================================================================

pub use backend::{ComfyHttpBackend, WorkflowBackend};
pub use client::{DefaultWorkflowClient, WorkflowExecutionClient};
pub use config::{ClientConfig, DEFAULT_HOST, DEFAULT_PORT};

// Silence unused dev-dependency warnings
#[cfg(test)]
use axum as _;
#[cfg(test)]
use tokio_test as _;
