//! User path normalization.

use std::env;
use std::path::PathBuf;

use super::error::PathError;

/// Normalize a user-provided path, expanding `~` and making it absolute.
pub fn expand_user_path(raw: &str) -> Result<PathBuf, PathError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PathError::EmptyPath);
    }

    let expanded = if trimmed.starts_with("~/") || trimmed == "~" {
        let home = dirs::home_dir().ok_or(PathError::NoHomeDir)?;
        if trimmed == "~" {
            home
        } else {
            home.join(trimmed.trim_start_matches("~/"))
        }
    } else {
        PathBuf::from(trimmed)
    };

    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        env::current_dir()
            .map(|cwd| cwd.join(expanded))
            .map_err(|e| PathError::CurrentDirError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_path_is_rejected() {
        assert!(matches!(expand_user_path("   "), Err(PathError::EmptyPath)));
    }

    #[test]
    fn absolute_path_is_unchanged() {
        assert_eq!(
            expand_user_path("/data/ComfyUI").unwrap(),
            PathBuf::from("/data/ComfyUI")
        );
    }

    #[test]
    fn tilde_expands_to_home() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        assert_eq!(expand_user_path("~").unwrap(), home);
        assert_eq!(
            expand_user_path("~/ComfyUI").unwrap(),
            home.join("ComfyUI")
        );
    }

    #[test]
    fn relative_path_is_made_absolute() {
        let resolved = expand_user_path("ComfyUI").unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("ComfyUI"));
    }
}
