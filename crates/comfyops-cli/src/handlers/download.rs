//! Download command handler.

use anyhow::Result;
use comfyops_core::DownloadSummary;

use super::{emit_json, read_url_lines};
use crate::bootstrap;
use crate::commands::TargetArgs;
use crate::error::CliError;
use crate::presentation;
use crate::progress::DownloadProgress;

/// Download command arguments passed from CLI.
pub struct DownloadArgs<'a> {
    pub urls: &'a [String],
    pub target: &'a TargetArgs,
    pub overwrite: bool,
    pub no_pget: bool,
    pub json: bool,
    pub bin_dir: Option<&'a str>,
}

/// Execute the download command.
///
/// Prints one line per input URL (or the JSON report) on stdout and the
/// summary on stderr. Fails when any entry failed, even if others
/// succeeded.
pub async fn execute(args: DownloadArgs<'_>) -> Result<()> {
    let lines = read_url_lines(args.urls).await?;
    let options = bootstrap::download_options(args.target)?
        .with_overwrite(args.overwrite)
        .with_external_disabled(args.no_pget);

    let (callback, printer) = DownloadProgress::new().into_callback();
    let manager = bootstrap::download_manager(args.bin_dir, Some(callback))?;

    let outcomes = manager.run(&lines, &options).await;
    if let Ok(mut printer) = printer.lock() {
        printer.finish();
    }
    let outcomes = outcomes.map_err(CliError::from)?;
    let summary = DownloadSummary::from_outcomes(&outcomes);

    if args.json {
        emit_json(&presentation::download_report(&outcomes, &summary))?;
    } else {
        for outcome in &outcomes {
            println!("{}", presentation::outcome_line(outcome));
        }
    }
    eprintln!("{summary}");

    if summary.has_failures() {
        return Err(CliError::Core(format!(
            "{} of {} downloads failed",
            summary.failed,
            summary.total()
        ))
        .into());
    }
    Ok(())
}
