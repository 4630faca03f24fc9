//! Subcommand definitions.
//!
//! Every connection and location flag has an environment fallback so the
//! tool can be configured once through `.env` or the shell.

use std::path::PathBuf;
use std::time::Duration;

use clap::Subcommand;

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Submit a workflow to ComfyUI and wait for its output images
    Run {
        /// Path to an API-format workflow JSON file
        #[arg(short, long)]
        workflow: PathBuf,
        /// ComfyUI host
        #[arg(long, env = "COMFYUI_HOST", default_value = comfyops_client::DEFAULT_HOST)]
        host: String,
        /// ComfyUI port
        #[arg(long, env = "COMFYUI_PORT", default_value_t = comfyops_client::DEFAULT_PORT)]
        port: u16,
        /// Seconds between status polls
        #[arg(long, default_value = "1.5", value_parser = parse_seconds)]
        poll: Duration,
        /// Seconds to wait for a terminal state
        #[arg(long, default_value = "300", value_parser = parse_seconds)]
        timeout: Duration,
    },

    /// Download model weights into the ComfyUI models folder
    Download {
        /// Weight URLs, optionally followed by a category; read from stdin when omitted
        urls: Vec<String>,
        #[command(flatten)]
        target: TargetArgs,
        /// Replace files that already exist
        #[arg(long)]
        overwrite: bool,
        /// Never use the external pget tool
        #[arg(long = "no-pget")]
        no_pget: bool,
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
        /// Directory where pget is looked up and installed
        #[arg(long = "bin-dir", env = "COMFYOPS_BIN_DIR")]
        bin_dir: Option<String>,
    },

    /// Show where each URL would be downloaded, without fetching
    Resolve {
        /// Weight URLs, optionally followed by a category; read from stdin when omitted
        urls: Vec<String>,
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Show resolved paths for the ComfyUI install and the pget binary
    Paths {
        /// ComfyUI install root
        #[arg(long, env = "COMFYUI_BASE")]
        base: Option<String>,
    },
}

/// Destination flags shared by `download` and `resolve`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// ComfyUI install root (defaults to ~/ComfyUI)
    #[arg(long, env = "COMFYUI_BASE")]
    pub base: Option<String>,
    /// Category for every URL without its own, e.g. "loras"
    #[arg(long, value_name = "CATEGORY")]
    pub subfolder: Option<String>,
}

/// Parse a positive number of seconds, fractions allowed.
fn parse_seconds(raw: &str) -> Result<Duration, String> {
    let secs: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("'{raw}' is not a number of seconds"))?;

    if !secs.is_finite() || secs <= 0.0 {
        return Err(format!("'{raw}' must be a positive number of seconds"));
    }
    Duration::try_from_secs_f64(secs).map_err(|e| e.to_string())
}
