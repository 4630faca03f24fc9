//! Download error types.
//!
//! Per-URL failures (`FetchError`) are collected into the outcome report and
//! never abort a run. `InstallError` only triggers the builtin fallback.
//! `DownloadError` is reserved for preconditions that stop a run before any
//! entry is processed.

use std::path::PathBuf;

use thiserror::Error;

use crate::paths::PathError;

/// Failure transferring a single URL.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The URL cannot be fetched (unparsable or unsupported scheme).
    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The caller-specified category is not a usable directory name.
    #[error("Unsafe category name: {category:?}")]
    UnsafeCategory { category: String },

    /// The server answered with a non-success status.
    #[error("HTTP {status} for {url}")]
    Http { status: u16, url: String },

    /// Network failure while connecting or streaming.
    #[error("Network error: {message}")]
    Network { message: String },

    /// I/O error writing the destination.
    #[error("I/O error ({kind}): {message}")]
    Io { kind: String, message: String },

    /// The external tool reported success but the file is not there.
    #[error("Transfer incomplete: {path} was not written")]
    IncompleteTransfer { path: PathBuf },

    /// The external fetch tool failed.
    #[error("External fetch tool failed: {message}")]
    ExternalTool { message: String },
}

impl FetchError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn external(message: impl Into<String>) -> Self {
        Self::ExternalTool {
            message: message.into(),
        }
    }

    /// Capture a `std::io::Error` as kind and message strings.
    #[must_use]
    pub fn from_io_error(err: &std::io::Error) -> Self {
        let kind = err.kind();
        Self::Io {
            kind: format!("{kind:?}"),
            message: err.to_string(),
        }
    }
}

/// Failure installing the external fetch tool.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("No prebuilt {tool} for {os}/{arch}")]
    UnsupportedPlatform {
        tool: String,
        os: String,
        arch: String,
    },

    #[error("Failed to fetch {url}: {message}")]
    Network { url: String, message: String },

    #[error("Failed to install into {path}: {reason}")]
    Io { path: PathBuf, reason: String },

    #[error("Cannot determine install directory: {0}")]
    NoBinDir(String),
}

/// Run-level precondition failures.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The installation base directory does not exist.
    #[error("ComfyUI base not found: {}", .0.display())]
    BaseNotFound(PathBuf),

    #[error(transparent)]
    Path(#[from] PathError),
}
