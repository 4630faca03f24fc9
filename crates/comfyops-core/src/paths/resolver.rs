//! Resolved path snapshot for CLI introspection.

use std::fmt;
use std::path::PathBuf;

use super::{PathError, models_dir, resolve_comfy_base, tool_bin_dir};

/// All resolved paths captured in a single struct.
///
/// Backs the `comfyops paths` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    /// ComfyUI install root
    pub comfy_base: PathBuf,
    /// `<comfy_base>/models`
    pub models_dir: PathBuf,
    /// Whether the install root currently exists
    pub base_exists: bool,
    /// Directory searched for (and receiving) the fetch tool
    pub tool_bin_dir: PathBuf,
}

impl ResolvedPaths {
    /// Resolve all paths, optionally overriding the ComfyUI base.
    pub fn resolve(comfy_base: Option<&str>) -> Result<Self, PathError> {
        let comfy_base = resolve_comfy_base(comfy_base)?;
        let models_dir = models_dir(&comfy_base);
        let base_exists = comfy_base.is_dir();
        let tool_bin_dir = tool_bin_dir()?;

        Ok(Self {
            comfy_base,
            models_dir,
            base_exists,
            tool_bin_dir,
        })
    }
}

impl fmt::Display for ResolvedPaths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "comfy_base = {}", self.comfy_base.display())?;
        writeln!(f, "base_exists = {}", self.base_exists)?;
        writeln!(f, "models_dir = {}", self.models_dir.display())?;
        write!(f, "tool_bin_dir = {}", self.tool_bin_dir.display())
    }
}
