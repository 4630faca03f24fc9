//! CLI-specific error types and mappings.
//!
//! Library errors are mapped onto sysexits-style exit codes here so that
//! scripts driving `comfyops` can tell a down server from a bad workflow.

use comfyops_core::{DownloadError, ExecutionError, JobDescriptionError, PathError};
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// The operation ran but did not succeed (failed job, failed downloads).
    #[error("{0}")]
    Core(String),

    /// Argument parsing error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// Malformed input data (workflow file is not JSON).
    #[error("Invalid input: {0}")]
    Data(String),

    /// The ComfyUI server could not be reached.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// IO error (file not found, permission denied, etc.).
    #[error("IO error: {0}")]
    Io(String),

    /// The job may still finish; retrying later can succeed.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Configuration error (missing base directory, unusable path).
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow Unix conventions:
    /// - 0: Success
    /// - 1: General error
    /// - 2: Misuse of shell command (invalid arguments)
    /// - 64-78: Reserved for specific error categories (see sysexits.h)
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Core(_) => 1,
            Self::Arguments(_) => 2,    // EX_USAGE
            Self::Data(_) => 65,        // EX_DATAERR
            Self::Unavailable(_) => 69, // EX_UNAVAILABLE
            Self::Io(_) => 74,          // EX_IOERR
            Self::Timeout(_) => 75,     // EX_TEMPFAIL
            Self::Config(_) => 78,      // EX_CONFIG
        }
    }
}

impl From<ExecutionError> for CliError {
    fn from(err: ExecutionError) -> Self {
        match err {
            ExecutionError::Connection { .. } => Self::Unavailable(err.to_string()),
            ExecutionError::Timeout { .. } => Self::Timeout(err.to_string()),
            ExecutionError::Rejected { .. } | ExecutionError::InvalidResponse { .. } => {
                Self::Core(err.to_string())
            }
        }
    }
}

impl From<JobDescriptionError> for CliError {
    fn from(err: JobDescriptionError) -> Self {
        match err {
            JobDescriptionError::Read { .. } => Self::Io(err.to_string()),
            JobDescriptionError::Parse { .. } => Self::Data(err.to_string()),
        }
    }
}

impl From<DownloadError> for CliError {
    fn from(err: DownloadError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<PathError> for CliError {
    fn from(err: PathError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
