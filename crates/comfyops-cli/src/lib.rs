//! `comfyops` command-line interface.
//!
//! Thin adapter over the library crates:
//! - `run` submits a workflow to ComfyUI and prints the artifact list
//! - `download` fetches weight files into `<base>/models/<category>/`
//! - `resolve` shows where each URL would land without fetching
//! - `paths` prints the resolved install locations

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Silence unused dev-dependency warnings
#[cfg(test)]
use tempfile as _;
#[cfg(test)]
use tokio_test as _;

// Used by the binary entry point only
use dotenvy as _;
use tracing_subscriber as _;

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod presentation;
pub mod progress;

// Re-export primary types for convenient access
pub use commands::Commands;
pub use error::CliError;
pub use parser::Cli;
