//! Destination category resolution.
//!
//! Maps a weight URL to a `models/` subfolder. An explicit category always
//! wins; otherwise a fixed, ordered keyword table is consulted. Pure and
//! deterministic.

use comfyops_core::weights::{CategoryHint, CategorySource, ModelCategory};

/// Ordered keyword table. First match wins, so more specific fragments
/// (`clip_vision`, `vae_approx`) precede their prefixes (`clip`, `vae`).
const HEURISTICS: &[(&str, ModelCategory)] = &[
    ("clip_vision", ModelCategory::ClipVision),
    ("taesd", ModelCategory::VaeApprox),
    ("vae_approx", ModelCategory::VaeApprox),
    ("controlnet", ModelCategory::Controlnet),
    ("control_net", ModelCategory::Controlnet),
    ("upscale", ModelCategory::UpscaleModels),
    ("esrgan", ModelCategory::UpscaleModels),
    ("lora", ModelCategory::Loras),
    ("embedding", ModelCategory::Embeddings),
    ("text_encoder", ModelCategory::TextEncoders),
    ("t5xxl", ModelCategory::TextEncoders),
    ("umt5", ModelCategory::TextEncoders),
    ("qwen", ModelCategory::TextEncoders),
    ("clip", ModelCategory::Clip),
    ("vae", ModelCategory::Vae),
    ("unet", ModelCategory::Unet),
    ("diffusion", ModelCategory::DiffusionModels),
    ("hypernetwork", ModelCategory::Hypernetworks),
    ("photomaker", ModelCategory::Photomaker),
    ("style_model", ModelCategory::StyleModels),
];

/// Resolves the destination category for one URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct DestinationResolver;

impl DestinationResolver {
    pub const fn new() -> Self {
        Self
    }

    /// Resolve a category with precedence: per-line override, then the run
    /// default, then the keyword heuristic.
    pub fn resolve(
        self,
        url: &str,
        hint: &CategoryHint,
        run_default: Option<&str>,
    ) -> (ModelCategory, CategorySource) {
        if let CategoryHint::Explicit(name) = hint {
            return (ModelCategory::from_name(name), CategorySource::Explicit);
        }

        if let Some(name) = run_default.filter(|name| !name.trim().is_empty()) {
            return (ModelCategory::from_name(name), CategorySource::RunDefault);
        }

        (Self::infer(url), CategorySource::Inferred)
    }

    /// Keyword heuristic over the filename, then the whole URL.
    ///
    /// Matching is case-insensitive; unmatched input resolves to
    /// `checkpoints`.
    pub fn infer(url_or_filename: &str) -> ModelCategory {
        let full = url_or_filename.to_ascii_lowercase();
        let filename = file_segment(&full);

        Self::match_table(filename)
            .or_else(|| Self::match_table(&full))
            .unwrap_or(ModelCategory::Checkpoints)
    }

    fn match_table(haystack: &str) -> Option<ModelCategory> {
        HEURISTICS
            .iter()
            .find(|(fragment, _)| haystack.contains(fragment))
            .map(|(_, category)| category.clone())
    }
}

/// Last path segment with any query or fragment removed.
fn file_segment(url: &str) -> &str {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    without_query
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(without_query)
}
