//! CLI bootstrap - the composition root.
//!
//! The only place where library configuration is assembled from parsed
//! flags. Handlers receive ready-made clients and managers.

use comfyops_client::{ClientConfig, DefaultWorkflowClient};
use comfyops_core::paths::{expand_user_path, resolve_comfy_base};
use comfyops_download::{DownloadOptions, InstallerConfig, ProgressCallback, WeightDownloadManager};

use crate::commands::TargetArgs;
use crate::error::CliError;

const USER_AGENT: &str = concat!("comfyops/", env!("CARGO_PKG_VERSION"));

/// Client for the ComfyUI instance at `host:port`.
pub fn workflow_client(host: &str, port: u16) -> DefaultWorkflowClient {
    let config = ClientConfig::from_host_port(host, port).with_user_agent(USER_AGENT);
    DefaultWorkflowClient::new(&config)
}

/// Download manager with the builtin fetch and the `pget` installer.
pub fn download_manager(
    bin_dir: Option<&str>,
    progress: Option<ProgressCallback>,
) -> Result<WeightDownloadManager, CliError> {
    let mut installer = InstallerConfig::new().with_user_agent(USER_AGENT);
    if let Some(dir) = bin_dir.filter(|d| !d.trim().is_empty()) {
        installer = installer.with_bin_dir(expand_user_path(dir)?);
    }

    Ok(WeightDownloadManager::standard(installer, progress))
}

/// Run options from the shared destination flags.
pub fn download_options(target: &TargetArgs) -> Result<DownloadOptions, CliError> {
    let base = resolve_comfy_base(target.base.as_deref())?;
    Ok(DownloadOptions::new(base).with_default_category(target.subfolder.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn options_use_explicit_base() {
        let target = TargetArgs {
            base: Some("/srv/ComfyUI".to_string()),
            subfolder: Some("loras".to_string()),
        };
        let options = download_options(&target).unwrap();
        assert_eq!(options.base(), Path::new("/srv/ComfyUI"));
    }

    #[test]
    fn blank_base_is_rejected() {
        let target = TargetArgs {
            base: Some("   ".to_string()),
            subfolder: None,
        };
        let err = download_options(&target).unwrap_err();
        assert_eq!(err.exit_code(), 78);
    }

    #[test]
    fn manager_builds_without_bin_dir() {
        assert!(download_manager(None, None).is_ok());
    }
}
