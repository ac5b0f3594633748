use serde::{Deserialize, Serialize};

/// Batching granularity for renders.
///
/// `Standard` renders after every completed stroke; `Hd` accumulates strokes into one
/// batch until the user asks for a render explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionMode {
    #[default]
    Standard,
    Hd,
}

impl ResolutionMode {
    pub fn from_hd(use_hd: bool) -> Self {
        if use_hd { Self::Hd } else { Self::Standard }
    }

    pub fn is_hd(&self) -> bool {
        matches!(self, Self::Hd)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Standard => "SD",
            Self::Hd => "HD",
        }
    }
}

/// Quality pass requested from the remote inpainting service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefinerType {
    None,
    #[default]
    Medium,
}

impl RefinerType {
    /// Wire value sent in the `refiner` form field and the `X-REFINER` header
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Medium => "medium",
        }
    }

    pub fn all() -> &'static [RefinerType] {
        &[RefinerType::None, RefinerType::Medium]
    }
}
