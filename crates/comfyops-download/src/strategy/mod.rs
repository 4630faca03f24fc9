//! Byte transfer strategies.
//!
//! Two implementations of [`FetchStrategy`]:
//! - [`ExternalParallelFetch`] hands the whole batch to `pget multifile`
//! - [`BuiltinSequentialFetch`] streams one URL at a time over reqwest
//!
//! Both write to a hidden temporary file next to the destination and rename
//! it into place only after a complete transfer, so an interrupted run never
//! leaves a file a later skip-if-exists check would accept.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use comfyops_core::weights::{FetchError, InstallError};

mod builtin;
mod external;
mod installer;

pub use builtin::{BuiltinSequentialFetch, DEFAULT_FETCH_TIMEOUT};
pub use external::ExternalParallelFetch;
pub use installer::{DEFAULT_RELEASE_BASE, InstallerConfig, Platform, TOOL_NAME, ToolInstaller};

// ============================================================================
// Types
// ============================================================================

/// One URL to transfer to one destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchJob {
    pub url: String,
    pub destination: PathBuf,
}

impl FetchJob {
    pub fn new(url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            destination: destination.into(),
        }
    }

    /// Hidden sibling the transfer writes to before the final rename.
    pub fn temp_path(&self) -> PathBuf {
        temp_path_for(&self.destination)
    }
}

/// `<dir>/.<filename>.part`, with whitespace in the name replaced by `_`
/// so the path fits a whitespace-separated manifest.
pub fn temp_path_for(destination: &Path) -> PathBuf {
    let name = destination
        .file_name()
        .map_or_else(|| "download".into(), |n| n.to_string_lossy());
    let name: String = name
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    destination.with_file_name(format!(".{name}.part"))
}

/// Per-job results of a batch, in job order.
pub type BatchResult = Vec<Result<(), FetchError>>;

// ============================================================================
// Strategy Trait
// ============================================================================

/// Transfers URLs to local paths.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FetchStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Transfer one URL to its destination.
    async fn fetch(&self, job: &FetchJob) -> Result<(), FetchError>;

    /// Transfer a batch.
    ///
    /// The outer error means the strategy itself broke down and none of its
    /// per-job results can be trusted; callers fall back to another
    /// strategy. The default implementation fetches sequentially and never
    /// fails as a whole.
    async fn fetch_batch(&self, jobs: &[FetchJob]) -> Result<BatchResult, FetchError> {
        let mut results = Vec::with_capacity(jobs.len());
        for job in jobs {
            results.push(self.fetch(job).await);
        }
        Ok(results)
    }
}

/// Source of the external strategy, consulted at most once per run.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ToolSource: Send + Sync {
    /// Locate (installing if needed) the tool and wrap it as a strategy.
    async fn acquire(&self) -> Result<Arc<dyn FetchStrategy>, InstallError>;
}

// ============================================================================
// Run-scoped Selection
// ============================================================================

/// Availability of the external tool within one run.
///
/// Starts `Unresolved`; the first resolution is cached for the rest of the
/// run.
pub(crate) enum ExternalState {
    Unresolved,
    Available(Arc<dyn FetchStrategy>),
    Unavailable,
}

impl ExternalState {
    /// Resolve once, then return the cached outcome.
    pub(crate) async fn resolve(&mut self, source: &dyn ToolSource) -> Option<Arc<dyn FetchStrategy>> {
        if matches!(self, Self::Unresolved) {
            *self = match source.acquire().await {
                Ok(strategy) => {
                    tracing::debug!(strategy = strategy.name(), "External fetch tool ready");
                    Self::Available(strategy)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "External fetch tool unavailable, using builtin download");
                    Self::Unavailable
                }
            };
        }

        match self {
            Self::Available(strategy) => Some(Arc::clone(strategy)),
            Self::Unresolved | Self::Unavailable => None,
        }
    }
}
