//! Raw URL list normalization.

use comfyops_core::weights::CategoryHint;

/// One meaningful input line: a URL and its category hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub url: String,
    pub hint: CategoryHint,
}

impl ParsedLine {
    /// Parse a single line of the form `url [category]`.
    ///
    /// Returns `None` for blank lines and `#` comments.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        let (url, hint) = match line.split_once(char::is_whitespace) {
            Some((url, rest)) if !rest.trim().is_empty() => {
                (url, CategoryHint::Explicit(rest.trim().to_string()))
            }
            Some((url, _)) => (url, CategoryHint::Inferred),
            None => (line, CategoryHint::Inferred),
        };

        Some(Self {
            url: url.to_string(),
            hint,
        })
    }
}

/// Normalize raw input into parsed lines, preserving order.
///
/// Each item may itself contain several newline-separated lines, so both
/// positional arguments and a whole stdin buffer are accepted.
pub fn normalize_input<S: AsRef<str>>(raw: &[S]) -> Vec<ParsedLine> {
    raw.iter()
        .flat_map(|chunk| chunk.as_ref().lines())
        .filter_map(ParsedLine::parse)
        .collect()
}
