//! Paths command handler.
//!
//! Prints every resolved location in `key = value` form for diagnosing
//! where downloads and the pget binary go.

use anyhow::Result;
use comfyops_core::ResolvedPaths;

use crate::error::CliError;

/// Execute the paths command.
pub fn execute(base: Option<&str>) -> Result<()> {
    let paths = ResolvedPaths::resolve(base).map_err(CliError::from)?;
    println!("{paths}");
    Ok(())
}
