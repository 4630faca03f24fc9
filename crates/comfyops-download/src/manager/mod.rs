//! Weight download orchestration.
//!
//! One run: normalize input, plan every destination, skip what already
//! exists, pick a strategy (external tool first, builtin fallback), fetch,
//! and report one outcome per input line in input order. Per-URL failures
//! are collected into the report; only a missing base directory aborts.

mod paths;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use comfyops_core::paths::PathError;
use comfyops_core::weights::{DownloadError, DownloadOutcome, FetchError, WeightUrlEntry};

use crate::input::normalize_input;
use crate::progress::ProgressCallback;
use crate::strategy::{
    BatchResult, BuiltinSequentialFetch, DEFAULT_FETCH_TIMEOUT, ExternalState, FetchJob,
    FetchStrategy, InstallerConfig, ToolInstaller, ToolSource,
};

pub use paths::{DEFAULT_FILENAME, PlannedEntry, filename_from_url, plan_entries, validate_url};

// ============================================================================
// Options
// ============================================================================

/// Per-run options.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub(crate) base: PathBuf,
    pub(crate) default_category: Option<String>,
    pub(crate) overwrite: bool,
    pub(crate) disable_external: bool,
}

impl DownloadOptions {
    /// Options for a ComfyUI install rooted at `base`.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            default_category: None,
            overwrite: false,
            disable_external: false,
        }
    }

    /// Category for lines that do not name one. Blank values are ignored.
    #[must_use]
    pub fn with_default_category(mut self, category: Option<String>) -> Self {
        self.default_category = category.filter(|c| !c.trim().is_empty());
        self
    }

    #[must_use]
    pub const fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Never use or install the external tool.
    #[must_use]
    pub const fn with_external_disabled(mut self, disabled: bool) -> Self {
        self.disable_external = disabled;
        self
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn default_category(&self) -> Option<&str> {
        self.default_category.as_deref()
    }
}

// ============================================================================
// Manager
// ============================================================================

/// Downloads weight files into a ComfyUI models folder.
///
/// Callers must not run two managers against overlapping destinations at
/// the same time.
pub struct WeightDownloadManager {
    builtin: Arc<dyn FetchStrategy>,
    tools: Arc<dyn ToolSource>,
}

impl WeightDownloadManager {
    /// Create a manager from explicit strategies.
    pub fn new(builtin: Arc<dyn FetchStrategy>, tools: Arc<dyn ToolSource>) -> Self {
        Self { builtin, tools }
    }

    /// Builtin reqwest fetch plus the `pget` installer.
    pub fn standard(installer: InstallerConfig, progress: Option<ProgressCallback>) -> Self {
        let mut builtin = BuiltinSequentialFetch::new(&installer.user_agent, DEFAULT_FETCH_TIMEOUT);
        if let Some(progress) = progress {
            builtin = builtin.with_progress(progress);
        }

        Self::new(Arc::new(builtin), Arc::new(ToolInstaller::new(installer)))
    }

    /// Plan destinations for raw input lines without touching the disk.
    pub fn plan<S: AsRef<str>>(lines: &[S], options: &DownloadOptions) -> Vec<PlannedEntry> {
        plan_entries(&options.base, &normalize_input(lines), options.default_category())
    }

    /// Run one batch of raw input lines.
    ///
    /// Returns one outcome per meaningful input line, in input order.
    pub async fn run<S: AsRef<str>>(
        &self,
        lines: &[S],
        options: &DownloadOptions,
    ) -> Result<Vec<DownloadOutcome>, DownloadError> {
        check_base(&options.base)?;

        let planned = Self::plan(lines, options);
        tracing::info!(entries = planned.len(), base = %options.base.display(), "Planning downloads");

        let mut outcomes: Vec<Option<DownloadOutcome>> = vec![None; planned.len()];
        let mut pending: Vec<(usize, WeightUrlEntry)> = Vec::new();
        // Destination -> index of the first entry that claimed it.
        let mut claimed: HashMap<PathBuf, usize> = HashMap::new();
        let mut duplicates: Vec<(usize, usize, WeightUrlEntry)> = Vec::new();

        for (index, PlannedEntry { entry, problem }) in planned.into_iter().enumerate() {
            if problem.is_none() {
                if let Some(&first) = claimed.get(&entry.local_path) {
                    duplicates.push((index, first, entry));
                    continue;
                }
                claimed.insert(entry.local_path.clone(), index);
            }

            outcomes[index] = match Self::triage(entry, problem, options).await {
                Ok(entry) => {
                    pending.push((index, entry));
                    None
                }
                Err(outcome) => Some(outcome),
            };
        }

        let jobs: Vec<FetchJob> = pending
            .iter()
            .map(|(_, entry)| FetchJob::new(&entry.source_url, &entry.local_path))
            .collect();
        let mut results = self.fetch_all(&jobs, options.disable_external).await.into_iter();

        for (index, entry) in pending {
            let result = results
                .next()
                .unwrap_or_else(|| Err(FetchError::external("no result reported for entry")));
            outcomes[index] = Some(match result {
                Ok(()) => {
                    tracing::info!(url = %entry.source_url, path = %entry.local_path.display(), "Downloaded");
                    DownloadOutcome::downloaded(entry)
                }
                Err(e) => {
                    tracing::warn!(url = %entry.source_url, error = %e, "Download failed");
                    DownloadOutcome::failed(entry, e)
                }
            });
        }

        // A repeated destination mirrors whatever happened to its first claimant.
        for (index, first, entry) in duplicates {
            let outcome = match outcomes[first].as_ref() {
                Some(earlier) if earlier.is_failed() => {
                    tracing::warn!(
                        url = %entry.source_url,
                        path = %entry.local_path.display(),
                        "Destination claimed by a failed entry",
                    );
                    DownloadOutcome::failed(
                        entry,
                        format!("same destination as failed entry {}", earlier.entry.source_url),
                    )
                }
                _ => {
                    tracing::warn!(
                        url = %entry.source_url,
                        path = %entry.local_path.display(),
                        "Destination already claimed earlier in this run, skipping",
                    );
                    DownloadOutcome::skipped(entry)
                }
            };
            outcomes[index] = Some(outcome);
        }

        Ok(outcomes.into_iter().flatten().collect())
    }

    /// Decide whether an entry needs fetching. `Err` carries its final
    /// outcome when it does not.
    async fn triage(
        entry: WeightUrlEntry,
        problem: Option<FetchError>,
        options: &DownloadOptions,
    ) -> Result<WeightUrlEntry, DownloadOutcome> {
        if let Some(problem) = problem {
            tracing::warn!(url = %entry.source_url, error = %problem, "Rejecting entry");
            return Err(DownloadOutcome::failed(entry, problem));
        }

        if !options.overwrite && entry.local_path.is_file() {
            tracing::info!(path = %entry.local_path.display(), "Already present, skipping");
            return Err(DownloadOutcome::skipped(entry));
        }

        if let Some(dir) = entry.local_path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(dir).await {
                let err = FetchError::from_io_error(&e);
                return Err(DownloadOutcome::failed(entry, err));
            }
        }

        Ok(entry)
    }

    /// Fetch every pending job, external tool first.
    async fn fetch_all(&self, jobs: &[FetchJob], disable_external: bool) -> BatchResult {
        if jobs.is_empty() {
            return Vec::new();
        }

        let mut external = if disable_external {
            ExternalState::Unavailable
        } else {
            ExternalState::Unresolved
        };

        if let Some(strategy) = external.resolve(self.tools.as_ref()).await {
            match strategy.fetch_batch(jobs).await {
                Ok(results) => return results,
                Err(e) => {
                    tracing::warn!(
                        strategy = strategy.name(),
                        error = %e,
                        "External fetch failed, retrying batch with builtin download",
                    );
                }
            }
        }

        tracing::info!(count = jobs.len(), strategy = self.builtin.name(), "Fetching sequentially");
        match self.builtin.fetch_batch(jobs).await {
            Ok(results) => results,
            Err(e) => jobs.iter().map(|_| Err(e.clone())).collect(),
        }
    }
}

fn check_base(base: &Path) -> Result<(), DownloadError> {
    if !base.exists() {
        return Err(DownloadError::BaseNotFound(base.to_path_buf()));
    }
    if !base.is_dir() {
        return Err(PathError::NotADirectory(base.to_path_buf()).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{MockFetchStrategy, MockToolSource};
    use comfyops_core::weights::{InstallError, OutcomeKind};

    fn no_tool() -> MockToolSource {
        let mut tools = MockToolSource::new();
        tools
            .expect_acquire()
            .returning(|| Err(InstallError::NoBinDir("test".to_string())));
        tools
    }

    fn builtin_failing_on(fragment: &'static str) -> MockFetchStrategy {
        let mut builtin = MockFetchStrategy::new();
        builtin.expect_name().return_const("mock-builtin");
        builtin.expect_fetch_batch().returning(move |jobs| {
            Ok(jobs
                .iter()
                .map(|job| {
                    if job.url.contains(fragment) {
                        Err(FetchError::Http {
                            status: 500,
                            url: job.url.clone(),
                        })
                    } else {
                        Ok(())
                    }
                })
                .collect())
        });
        builtin
    }

    fn manager(builtin: MockFetchStrategy, tools: MockToolSource) -> WeightDownloadManager {
        WeightDownloadManager::new(Arc::new(builtin), Arc::new(tools))
    }

    fn kinds(outcomes: &[DownloadOutcome]) -> Vec<OutcomeKind> {
        outcomes.iter().map(|o| o.result).collect()
    }

    #[tokio::test]
    async fn one_failure_does_not_abort_the_batch() {
        let base = tempfile::tempdir().unwrap();
        let manager = manager(builtin_failing_on("broken"), no_tool());

        let outcomes = manager
            .run(
                &[
                    "https://h/one.safetensors",
                    "https://h/broken.safetensors",
                    "https://h/three.safetensors",
                ],
                &DownloadOptions::new(base.path()),
            )
            .await
            .unwrap();

        assert_eq!(
            kinds(&outcomes),
            [OutcomeKind::Downloaded, OutcomeKind::Failed, OutcomeKind::Downloaded]
        );
        assert_eq!(outcomes[1].error.as_deref(), Some("HTTP 500 for https://h/broken.safetensors"));
    }

    #[tokio::test]
    async fn broken_external_batch_falls_back_to_builtin() {
        let base = tempfile::tempdir().unwrap();

        let mut tools = MockToolSource::new();
        tools.expect_acquire().times(1).returning(|| {
            let mut external = MockFetchStrategy::new();
            external.expect_name().return_const("mock-pget");
            external
                .expect_fetch_batch()
                .times(1)
                .returning(|_| Err(FetchError::external("exit status 1")));
            Ok(Arc::new(external) as Arc<dyn FetchStrategy>)
        });

        let mut builtin = MockFetchStrategy::new();
        builtin.expect_name().return_const("mock-builtin");
        builtin
            .expect_fetch_batch()
            .times(1)
            .returning(|jobs| Ok(jobs.iter().map(|_| Ok(())).collect()));

        let outcomes = manager(builtin, tools)
            .run(
                &["https://h/a.safetensors\nhttps://h/b.safetensors"],
                &DownloadOptions::new(base.path()),
            )
            .await
            .unwrap();

        assert_eq!(kinds(&outcomes), [OutcomeKind::Downloaded, OutcomeKind::Downloaded]);
    }

    #[tokio::test]
    async fn external_results_are_used_when_the_tool_works() {
        let base = tempfile::tempdir().unwrap();

        let mut tools = MockToolSource::new();
        tools.expect_acquire().times(1).returning(|| {
            let mut external = MockFetchStrategy::new();
            external.expect_name().return_const("mock-pget");
            external.expect_fetch_batch().returning(|jobs| {
                Ok(jobs
                    .iter()
                    .map(|job| {
                        Err(FetchError::IncompleteTransfer {
                            path: job.destination.clone(),
                        })
                    })
                    .collect())
            });
            Ok(Arc::new(external) as Arc<dyn FetchStrategy>)
        });

        let mut builtin = MockFetchStrategy::new();
        builtin.expect_fetch_batch().times(0);

        let outcomes = manager(builtin, tools)
            .run(&["https://h/a.safetensors"], &DownloadOptions::new(base.path()))
            .await
            .unwrap();

        assert_eq!(kinds(&outcomes), [OutcomeKind::Failed]);
    }

    #[tokio::test]
    async fn disabled_external_never_touches_the_tool() {
        let base = tempfile::tempdir().unwrap();
        let mut tools = MockToolSource::new();
        tools.expect_acquire().times(0);

        let outcomes = manager(builtin_failing_on("nothing"), tools)
            .run(
                &["https://h/a.safetensors"],
                &DownloadOptions::new(base.path()).with_external_disabled(true),
            )
            .await
            .unwrap();

        assert_eq!(kinds(&outcomes), [OutcomeKind::Downloaded]);
    }

    #[tokio::test]
    async fn existing_files_are_skipped_without_fetching() {
        let base = tempfile::tempdir().unwrap();
        let existing = base.path().join("models/vae/model.safetensors");
        std::fs::create_dir_all(existing.parent().unwrap()).unwrap();
        std::fs::write(&existing, b"weights").unwrap();

        let mut tools = MockToolSource::new();
        tools.expect_acquire().times(0);
        let mut builtin = MockFetchStrategy::new();
        builtin.expect_fetch_batch().times(0);

        let outcomes = manager(builtin, tools)
            .run(
                &["https://h/model.safetensors vae"],
                &DownloadOptions::new(base.path()),
            )
            .await
            .unwrap();

        assert_eq!(kinds(&outcomes), [OutcomeKind::Skipped]);
        assert_eq!(outcomes[0].entry.local_path, existing);
    }

    #[tokio::test]
    async fn overwrite_fetches_existing_files() {
        let base = tempfile::tempdir().unwrap();
        let existing = base.path().join("models/vae/model.safetensors");
        std::fs::create_dir_all(existing.parent().unwrap()).unwrap();
        std::fs::write(&existing, b"weights").unwrap();

        let outcomes = manager(builtin_failing_on("nothing"), no_tool())
            .run(
                &["https://h/model.safetensors vae"],
                &DownloadOptions::new(base.path()).with_overwrite(true),
            )
            .await
            .unwrap();

        assert_eq!(kinds(&outcomes), [OutcomeKind::Downloaded]);
    }

    #[tokio::test]
    async fn stale_partial_file_is_not_treated_as_present() {
        let base = tempfile::tempdir().unwrap();
        let dir = base.path().join("models/vae");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(".model.safetensors.part"), b"half").unwrap();

        let outcomes = manager(builtin_failing_on("nothing"), no_tool())
            .run(
                &["https://h/model.safetensors vae"],
                &DownloadOptions::new(base.path()),
            )
            .await
            .unwrap();

        assert_eq!(kinds(&outcomes), [OutcomeKind::Downloaded]);
    }

    #[tokio::test]
    async fn duplicate_destination_is_fetched_once() {
        let base = tempfile::tempdir().unwrap();
        let mut builtin = MockFetchStrategy::new();
        builtin.expect_name().return_const("mock-builtin");
        builtin.expect_fetch_batch().times(1).returning(|jobs| {
            assert_eq!(jobs.len(), 1);
            Ok(vec![Ok(())])
        });

        let outcomes = manager(builtin, no_tool())
            .run(
                &[
                    "https://a/model.safetensors vae",
                    "https://b/model.safetensors vae",
                ],
                &DownloadOptions::new(base.path()),
            )
            .await
            .unwrap();

        assert_eq!(kinds(&outcomes), [OutcomeKind::Downloaded, OutcomeKind::Skipped]);
    }

    #[tokio::test]
    async fn duplicate_of_a_failed_entry_fails_too() {
        let base = tempfile::tempdir().unwrap();
        let mut builtin = MockFetchStrategy::new();
        builtin.expect_name().return_const("mock-builtin");
        builtin.expect_fetch_batch().times(1).returning(|jobs| {
            assert_eq!(jobs.len(), 1);
            Ok(vec![Err(FetchError::Http {
                status: 404,
                url: jobs[0].url.clone(),
            })])
        });

        let outcomes = manager(builtin, no_tool())
            .run(
                &[
                    "https://a/model.safetensors vae",
                    "https://b/model.safetensors vae",
                ],
                &DownloadOptions::new(base.path()),
            )
            .await
            .unwrap();

        assert_eq!(kinds(&outcomes), [OutcomeKind::Failed, OutcomeKind::Failed]);
        assert!(outcomes[1].error.as_deref().unwrap().contains("https://a/model.safetensors"));
    }

    #[tokio::test]
    async fn duplicate_of_a_present_file_is_skipped() {
        let base = tempfile::tempdir().unwrap();
        let existing = base.path().join("models/vae/model.safetensors");
        std::fs::create_dir_all(existing.parent().unwrap()).unwrap();
        std::fs::write(&existing, b"weights").unwrap();

        let mut builtin = MockFetchStrategy::new();
        builtin.expect_fetch_batch().times(0);

        let outcomes = manager(builtin, no_tool())
            .run(
                &[
                    "https://a/model.safetensors vae",
                    "https://b/model.safetensors vae",
                ],
                &DownloadOptions::new(base.path()),
            )
            .await
            .unwrap();

        assert_eq!(kinds(&outcomes), [OutcomeKind::Skipped, OutcomeKind::Skipped]);
    }

    #[tokio::test]
    async fn invalid_entries_never_reach_a_strategy() {
        let base = tempfile::tempdir().unwrap();
        let mut builtin = MockFetchStrategy::new();
        builtin.expect_name().return_const("mock-builtin");
        builtin.expect_fetch_batch().times(1).returning(|jobs| {
            assert_eq!(jobs.len(), 1);
            assert_eq!(jobs[0].url, "https://h/ok.safetensors");
            Ok(vec![Ok(())])
        });

        let outcomes = manager(builtin, no_tool())
            .run(
                &[
                    "ftp://h/model.safetensors",
                    "https://h/ok.safetensors",
                    "https://h/x.safetensors ..",
                ],
                &DownloadOptions::new(base.path()),
            )
            .await
            .unwrap();

        assert_eq!(
            kinds(&outcomes),
            [OutcomeKind::Failed, OutcomeKind::Downloaded, OutcomeKind::Failed]
        );
    }

    #[tokio::test]
    async fn missing_base_aborts_before_any_entry() {
        let dir = tempfile::tempdir().unwrap();
        let mut tools = MockToolSource::new();
        tools.expect_acquire().times(0);
        let mut builtin = MockFetchStrategy::new();
        builtin.expect_fetch_batch().times(0);

        let err = manager(builtin, tools)
            .run(
                &["https://h/a.safetensors"],
                &DownloadOptions::new(dir.path().join("ComfyUI")),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::BaseNotFound(_)));
    }

    #[tokio::test]
    async fn base_that_is_a_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("ComfyUI");
        std::fs::write(&file, b"").unwrap();

        let err = manager(MockFetchStrategy::new(), MockToolSource::new())
            .run(&["https://h/a.safetensors"], &DownloadOptions::new(&file))
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::Path(PathError::NotADirectory(_))));
    }

    #[tokio::test]
    async fn only_comments_produce_an_empty_report() {
        let base = tempfile::tempdir().unwrap();
        let mut tools = MockToolSource::new();
        tools.expect_acquire().times(0);

        let outcomes = manager(MockFetchStrategy::new(), tools)
            .run(&["# nothing here\n\n"], &DownloadOptions::new(base.path()))
            .await
            .unwrap();

        assert!(outcomes.is_empty());
    }

    #[test]
    fn blank_default_category_is_ignored() {
        let options = DownloadOptions::new("/data").with_default_category(Some("  ".to_string()));
        assert!(options.default_category.is_none());
    }

    #[test]
    fn plan_applies_run_default_without_io() {
        let options = DownloadOptions::new("/nonexistent/ComfyUI")
            .with_default_category(Some("loras".to_string()));
        let planned = WeightDownloadManager::plan(
            &["https://h/a.safetensors\nhttps://h/b.safetensors vae"],
            &options,
        );

        assert_eq!(planned.len(), 2);
        assert_eq!(
            planned[0].entry.local_path,
            PathBuf::from("/nonexistent/ComfyUI/models/loras/a.safetensors")
        );
        assert_eq!(
            planned[1].entry.local_path,
            PathBuf::from("/nonexistent/ComfyUI/models/vae/b.safetensors")
        );
        assert!(planned.iter().all(|p| p.problem.is_none()));
    }
}
