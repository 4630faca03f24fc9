//! Destination path planning.
//!
//! Every entry's category and local path are fixed here, before any I/O,
//! and never recomputed.

use std::path::Path;

use comfyops_core::paths::category_dir;
use comfyops_core::weights::{FetchError, WeightUrlEntry};
use url::Url;

use crate::input::ParsedLine;
use crate::resolver::DestinationResolver;

/// Filename used when a URL has no usable last path segment.
pub const DEFAULT_FILENAME: &str = "downloaded.safetensors";

/// A planned entry, with the reason it cannot be fetched if any.
#[derive(Debug, Clone)]
pub struct PlannedEntry {
    pub entry: WeightUrlEntry,
    pub problem: Option<FetchError>,
}

/// Derive the local filename from a URL.
///
/// Takes the last non-empty path segment, percent-decodes it and replaces
/// path separators so the name stays a single component. Query and fragment
/// are ignored.
pub fn filename_from_url(raw: &str) -> String {
    let path = Url::parse(raw).map_or_else(
        |_| {
            raw.split(['?', '#'])
                .next()
                .unwrap_or_default()
                .to_string()
        },
        |url| url.path().to_string(),
    );

    let Some(segment) = path.split('/').rev().find(|s| !s.is_empty()) else {
        return DEFAULT_FILENAME.to_string();
    };

    let decoded = urlencoding::decode(segment).map_or_else(|_| segment.to_string(), |s| s.into_owned());
    let cleaned = decoded.replace(['/', '\\'], "_");

    match cleaned.trim() {
        "" | "." | ".." => DEFAULT_FILENAME.to_string(),
        name => name.to_string(),
    }
}

/// Check that a URL can be handed to a fetch strategy.
pub fn validate_url(raw: &str) -> Result<Url, FetchError> {
    let url = Url::parse(raw).map_err(|e| FetchError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(FetchError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{scheme}'"),
        }),
    }
}

/// Plan destinations for parsed lines under `<base>/models/`.
pub fn plan_entries(
    base: &Path,
    lines: &[ParsedLine],
    run_default: Option<&str>,
) -> Vec<PlannedEntry> {
    let resolver = DestinationResolver::new();

    lines
        .iter()
        .map(|line| {
            let (category, category_source) = resolver.resolve(&line.url, &line.hint, run_default);
            let local_path = category_dir(base, &category).join(filename_from_url(&line.url));

            let problem = if category.is_safe_dir_name() {
                validate_url(&line.url).err()
            } else {
                Some(FetchError::UnsafeCategory {
                    category: category.as_str().to_string(),
                })
            };

            PlannedEntry {
                entry: WeightUrlEntry {
                    source_url: line.url.clone(),
                    category,
                    category_source,
                    local_path,
                },
                problem,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use comfyops_core::weights::{CategoryHint, CategorySource, ModelCategory};
    use std::path::PathBuf;

    fn line(raw: &str) -> ParsedLine {
        ParsedLine::parse(raw).expect("non-empty line")
    }

    #[test]
    fn explicit_category_example_path() {
        let planned = plan_entries(
            Path::new("/data"),
            &[line("https://h/model.safetensors vae")],
            None,
        );

        assert_eq!(
            planned[0].entry.local_path,
            PathBuf::from("/data/models/vae/model.safetensors")
        );
        assert_eq!(planned[0].entry.category_source, CategorySource::Explicit);
        assert!(planned[0].problem.is_none());
    }

    #[test]
    fn filename_is_percent_decoded() {
        assert_eq!(
            filename_from_url("https://h/files/my%20model%2Bv2.safetensors?download=true"),
            "my model+v2.safetensors"
        );
    }

    #[test]
    fn encoded_separators_do_not_escape_the_directory() {
        assert_eq!(
            filename_from_url("https://h/a/..%2F..%2Fetc%2Fpasswd"),
            ".._.._etc_passwd"
        );
    }

    #[test]
    fn trailing_slash_uses_previous_segment() {
        assert_eq!(filename_from_url("https://h/a/model.bin/"), "model.bin");
    }

    #[test]
    fn empty_path_uses_default_filename() {
        assert_eq!(filename_from_url("https://h/"), DEFAULT_FILENAME);
        assert_eq!(filename_from_url("https://h"), DEFAULT_FILENAME);
    }

    #[test]
    fn non_http_scheme_is_rejected() {
        let err = validate_url("ftp://h/model.safetensors").unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
        assert!(validate_url("not a url").is_err());
        assert!(validate_url("https://h/model.safetensors").is_ok());
    }

    #[test]
    fn invalid_url_is_planned_with_a_problem() {
        let planned = plan_entries(Path::new("/data"), &[line("file:///etc/hosts")], None);
        assert!(matches!(
            planned[0].problem,
            Some(FetchError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn unsafe_category_is_planned_with_a_problem() {
        let planned = plan_entries(
            Path::new("/data"),
            &[line("https://h/model.safetensors ../../bin")],
            None,
        );
        assert!(matches!(
            planned[0].problem,
            Some(FetchError::UnsafeCategory { .. })
        ));
    }

    #[test]
    fn run_default_applies_to_lines_without_category() {
        let planned = plan_entries(
            Path::new("/data"),
            &[
                line("https://h/a_lora.safetensors"),
                line("https://h/b.safetensors clip"),
            ],
            Some("ipadapter"),
        );

        assert_eq!(
            planned[0].entry.category,
            ModelCategory::Custom("ipadapter".to_string())
        );
        assert_eq!(planned[0].entry.category_source, CategorySource::RunDefault);
        assert_eq!(planned[1].entry.category, ModelCategory::Clip);
        assert_eq!(
            ParsedLine::parse("https://h/b.safetensors clip").unwrap().hint,
            CategoryHint::Explicit("clip".to_string())
        );
    }
}
