//! Destination categories under `<base>/models/`.

use std::fmt;

use serde::{Serialize, Serializer};

/// A subdirectory of the ComfyUI `models/` folder.
///
/// The known variants mirror the folders a stock ComfyUI install ships
/// with. `Custom` carries caller-specified categories outside that set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModelCategory {
    Checkpoints,
    Clip,
    ClipVision,
    Controlnet,
    DiffusionModels,
    Embeddings,
    Loras,
    TextEncoders,
    Unet,
    Vae,
    VaeApprox,
    UpscaleModels,
    Hypernetworks,
    Photomaker,
    StyleModels,
    Custom(String),
}

impl ModelCategory {
    /// Every known category, in declaration order.
    pub const KNOWN: [Self; 15] = [
        Self::Checkpoints,
        Self::Clip,
        Self::ClipVision,
        Self::Controlnet,
        Self::DiffusionModels,
        Self::Embeddings,
        Self::Loras,
        Self::TextEncoders,
        Self::Unet,
        Self::Vae,
        Self::VaeApprox,
        Self::UpscaleModels,
        Self::Hypernetworks,
        Self::Photomaker,
        Self::StyleModels,
    ];

    /// Directory name for this category.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Checkpoints => "checkpoints",
            Self::Clip => "clip",
            Self::ClipVision => "clip_vision",
            Self::Controlnet => "controlnet",
            Self::DiffusionModels => "diffusion_models",
            Self::Embeddings => "embeddings",
            Self::Loras => "loras",
            Self::TextEncoders => "text_encoders",
            Self::Unet => "unet",
            Self::Vae => "vae",
            Self::VaeApprox => "vae_approx",
            Self::UpscaleModels => "upscale_models",
            Self::Hypernetworks => "hypernetworks",
            Self::Photomaker => "photomaker",
            Self::StyleModels => "style_models",
            Self::Custom(name) => name,
        }
    }

    /// Look up a known category by directory name (case-insensitive).
    pub fn known(name: &str) -> Option<Self> {
        let lower = name.trim().to_ascii_lowercase();
        Self::KNOWN.into_iter().find(|c| c.as_str() == lower)
    }

    /// Interpret a caller-supplied category name.
    ///
    /// Known names map to their variant regardless of case; anything else
    /// is kept verbatim as `Custom`.
    pub fn from_name(name: &str) -> Self {
        Self::known(name).unwrap_or_else(|| Self::Custom(name.trim().to_string()))
    }

    pub const fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }

    /// Whether the name is usable as a single directory component.
    pub fn is_safe_dir_name(&self) -> bool {
        let name = self.as_str();
        !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\'])
            && !name.chars().any(char::is_control)
    }
}

impl fmt::Display for ModelCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ModelCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Category information carried by one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryHint {
    /// The caller named the category.
    Explicit(String),
    /// No category given; infer it from the URL.
    Inferred,
}

/// Where an entry's resolved category came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CategorySource {
    /// Per-line override.
    Explicit,
    /// Run-wide default override.
    RunDefault,
    /// Filename/URL heuristic.
    Inferred,
}
