//! ComfyUI installation layout and fetch tool location.

use std::env;
use std::path::{Path, PathBuf};

use super::error::PathError;
use super::platform::expand_user_path;
use crate::weights::ModelCategory;

/// Default ComfyUI install root.
pub const DEFAULT_COMFY_BASE: &str = "~/ComfyUI";

/// Name of the models folder under the install root.
pub const MODELS_DIR_NAME: &str = "models";

/// Environment variable overriding the fetch tool's binary directory.
pub const BIN_DIR_ENV: &str = "COMFYOPS_BIN_DIR";

/// Resolve the ComfyUI base directory from an optional user value.
///
/// The directory is not required to exist; callers decide whether a
/// missing base is an error.
pub fn resolve_comfy_base(raw: Option<&str>) -> Result<PathBuf, PathError> {
    expand_user_path(raw.unwrap_or(DEFAULT_COMFY_BASE))
}

/// `<base>/models`
pub fn models_dir(base: &Path) -> PathBuf {
    base.join(MODELS_DIR_NAME)
}

/// `<base>/models/<category>`
pub fn category_dir(base: &Path, category: &ModelCategory) -> PathBuf {
    models_dir(base).join(category.as_str())
}

/// User-writable directory where the fetch tool is looked up and installed.
///
/// Resolution order:
/// 1. `COMFYOPS_BIN_DIR` environment variable
/// 2. `~/.local/bin`
pub fn tool_bin_dir() -> Result<PathBuf, PathError> {
    if let Ok(path) = env::var(BIN_DIR_ENV) {
        if !path.trim().is_empty() {
            return expand_user_path(&path);
        }
    }

    let home = dirs::home_dir().ok_or(PathError::NoHomeDir)?;
    Ok(home.join(".local").join("bin"))
}
