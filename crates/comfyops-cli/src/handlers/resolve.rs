//! Resolve command handler.
//!
//! Dry run of the download planner: no directories are created and nothing
//! is fetched.

use anyhow::Result;
use comfyops_download::WeightDownloadManager;

use super::read_url_lines;
use crate::bootstrap;
use crate::commands::TargetArgs;
use crate::presentation;

/// Execute the resolve command.
pub async fn execute(urls: &[String], target: &TargetArgs) -> Result<()> {
    let lines = read_url_lines(urls).await?;
    let options = bootstrap::download_options(target)?;

    for planned in WeightDownloadManager::plan(&lines, &options) {
        println!("{}", presentation::plan_line(&planned));
    }
    Ok(())
}
