//! Path utilities for the ComfyUI installation and the fetch tool.
//!
//! This module provides the canonical path resolution for all comfyops
//! components:
//! - The ComfyUI base directory and its `models/<category>` layout
//! - The user-writable binary directory for the external fetch tool
//!
//! # Design
//!
//! - Returns `PathBuf` and `PathError` for clear error handling
//! - No interactive/terminal I/O - adapters handle user prompts separately
//! - User-path expansion is kept private in `platform`

mod error;
mod install;
mod platform;
mod resolver;

pub use error::PathError;
pub use install::{
    BIN_DIR_ENV, DEFAULT_COMFY_BASE, MODELS_DIR_NAME, category_dir, models_dir,
    resolve_comfy_base, tool_bin_dir,
};
pub use platform::expand_user_path;
pub use resolver::ResolvedPaths;
