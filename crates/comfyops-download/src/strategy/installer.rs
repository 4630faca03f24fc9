//! External fetch tool discovery and installation.
//!
//! Looks the tool up on `PATH`, then in the user bin directory, and
//! otherwise downloads the prebuilt release binary for this platform into
//! that directory. No privilege escalation: the bin directory must be
//! user-writable.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use comfyops_core::paths::tool_bin_dir;
use comfyops_core::weights::InstallError;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use super::{ExternalParallelFetch, FetchStrategy, ToolSource};

// ============================================================================
// Constants
// ============================================================================

/// Name of the external parallel fetch tool.
pub const TOOL_NAME: &str = "pget";

/// Latest-release download prefix for the tool binaries.
pub const DEFAULT_RELEASE_BASE: &str = "https://github.com/replicate/pget/releases/latest/download";

const INSTALL_TIMEOUT: Duration = Duration::from_secs(60);

// ============================================================================
// Platform
// ============================================================================

/// Operating system and CPU architecture, as reported by the Rust target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub os: String,
    pub arch: String,
}

impl Platform {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// The platform this binary was built for.
    pub fn current() -> Self {
        Self::new(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Release asset name, e.g. `pget_Linux_x86_64` or `pget_Darwin_arm64`.
    pub fn asset_name(&self) -> Result<String, InstallError> {
        let os = match self.os.as_str() {
            "linux" => "Linux",
            "macos" => "Darwin",
            _ => return Err(self.unsupported()),
        };
        let arch = match self.arch.as_str() {
            "x86_64" => "x86_64",
            "aarch64" => "arm64",
            _ => return Err(self.unsupported()),
        };
        Ok(format!("{TOOL_NAME}_{os}_{arch}"))
    }

    fn unsupported(&self) -> InstallError {
        InstallError::UnsupportedPlatform {
            tool: TOOL_NAME.to_string(),
            os: self.os.clone(),
            arch: self.arch.clone(),
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Where to look for the tool and where to install it from.
#[derive(Debug, Clone)]
pub struct InstallerConfig {
    /// Install directory; `None` resolves `COMFYOPS_BIN_DIR` or `~/.local/bin`
    pub(crate) bin_dir: Option<PathBuf>,
    pub(crate) release_base_url: String,
    pub(crate) platform: Platform,
    /// Whether to consult `PATH` before the bin directory
    pub(crate) search_path: bool,
    pub(crate) user_agent: String,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            bin_dir: None,
            release_base_url: DEFAULT_RELEASE_BASE.to_string(),
            platform: Platform::current(),
            search_path: true,
            user_agent: concat!("comfyops/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl InstallerConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_bin_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.bin_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_release_base_url(mut self, url: impl Into<String>) -> Self {
        self.release_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Skip the `PATH` lookup (only the bin directory is consulted).
    #[must_use]
    pub const fn without_path_search(mut self) -> Self {
        self.search_path = false;
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

// ============================================================================
// Installer
// ============================================================================

/// Finds or installs the external fetch tool.
pub struct ToolInstaller {
    config: InstallerConfig,
}

impl ToolInstaller {
    pub const fn new(config: InstallerConfig) -> Self {
        Self { config }
    }

    /// Path to a runnable tool binary, installing it if necessary.
    pub async fn ensure_installed(&self) -> Result<PathBuf, InstallError> {
        if self.config.search_path {
            if let Ok(path) = which::which(TOOL_NAME) {
                tracing::debug!(path = %path.display(), "Found {TOOL_NAME} on PATH");
                return Ok(path);
            }
        }

        let bin_dir = self.bin_dir()?;
        let target = bin_dir.join(TOOL_NAME);
        if is_executable(&target) {
            tracing::debug!(path = %target.display(), "Found installed {TOOL_NAME}");
            return Ok(target);
        }

        let asset = self.config.platform.asset_name()?;
        let url = format!("{}/{asset}", self.config.release_base_url);
        tracing::info!(url = %url, dest = %target.display(), "Installing {TOOL_NAME}");

        let bytes = self.download(&url).await?;
        let dest = target.clone();
        tokio::task::spawn_blocking(move || install_binary(&bin_dir, &dest, &bytes))
            .await
            .map_err(|e| InstallError::Io {
                path: target.clone(),
                reason: e.to_string(),
            })??;

        tracing::info!(path = %target.display(), "Installed {TOOL_NAME}");
        Ok(target)
    }

    fn bin_dir(&self) -> Result<PathBuf, InstallError> {
        match &self.config.bin_dir {
            Some(dir) => Ok(dir.clone()),
            None => tool_bin_dir().map_err(|e| InstallError::NoBinDir(e.to_string())),
        }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, InstallError> {
        let network = |message: String| InstallError::Network {
            url: url.to_string(),
            message,
        };

        let client = reqwest::Client::builder()
            .user_agent(self.config.user_agent.as_str())
            .timeout(INSTALL_TIMEOUT)
            .build()
            .map_err(|e| network(e.to_string()))?;

        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(network(format!("HTTP {status}")));
        }

        let bytes = response.bytes().await.map_err(|e| network(e.to_string()))?;
        if bytes.is_empty() {
            return Err(network("empty response body".to_string()));
        }
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ToolSource for ToolInstaller {
    async fn acquire(&self) -> Result<Arc<dyn FetchStrategy>, InstallError> {
        let binary = self.ensure_installed().await?;
        Ok(Arc::new(ExternalParallelFetch::new(binary)))
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Write the binary through a temporary file, mark it executable and move it
/// into place so a half-written binary is never picked up.
fn install_binary(bin_dir: &Path, target: &Path, bytes: &[u8]) -> Result<(), InstallError> {
    let io_err = |path: &Path, e: std::io::Error| InstallError::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    fs::create_dir_all(bin_dir).map_err(|e| io_err(bin_dir, e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(bin_dir).map_err(|e| io_err(bin_dir, e))?;
    tmp.write_all(bytes).map_err(|e| io_err(tmp.path(), e))?;
    tmp.flush().map_err(|e| io_err(tmp.path(), e))?;

    #[cfg(unix)]
    {
        fs::set_permissions(tmp.path(), fs::Permissions::from_mode(0o755))
            .map_err(|e| io_err(tmp.path(), e))?;
    }

    tmp.persist(target).map_err(|e| io_err(target, e.error))?;
    Ok(())
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
