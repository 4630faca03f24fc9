//! Main CLI parser and top-level argument handling.

use clap::Parser;

use crate::commands::Commands;

/// Command-line interface for running ComfyUI workflows and fetching weights.
#[derive(Parser)]
#[command(name = "comfyops")]
#[command(about = "Run ComfyUI workflows and fetch model weights")]
#[command(version)]
pub struct Cli {
    /// Enable verbose/debug logging on stderr
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}
