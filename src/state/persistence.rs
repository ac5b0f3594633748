use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{RefinerType, ResolutionMode};

pub const BRUSH_SIZE_MIN: f32 = 10.0;
pub const BRUSH_SIZE_MAX: f32 = 200.0;
pub const BRUSH_SIZE_DEFAULT: f32 = 50.0;
pub const BRUSH_SIZE_COARSE_DEFAULT: f32 = 90.0;

/// Longer-side limit of the working image in standard mode
pub const RESIZE_LD: u32 = 720;
/// Longer-side limit of the working image in HD mode
pub const RESIZE_HD: u32 = 2048;
/// Longer-side limit of each image sent to the result store
pub const UPLOAD_MAX_SIZE: u32 = 2000;

/// Errors that can occur during settings persistence operations
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to serialize settings: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
}

/// Result type for persistence operations
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// User preferences that outlive a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub brush_size: f32,
    pub use_hd: bool,
    pub refiner: RefinerType,
    /// Touch-style pointer: larger default brush, no render on stroke completion
    pub coarse_pointer: bool,
    pub resize_ld: u32,
    pub resize_hd: u32,
    pub upload_max_size: u32,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            brush_size: BRUSH_SIZE_DEFAULT,
            use_hd: false,
            refiner: RefinerType::default(),
            coarse_pointer: false,
            resize_ld: RESIZE_LD,
            resize_hd: RESIZE_HD,
            upload_max_size: UPLOAD_MAX_SIZE,
        }
    }
}

impl EditorSettings {
    /// Switch between touch-style and precise pointer input. Going coarse grows the
    /// brush to the coarse default while it is still at the precise default.
    pub fn set_coarse_pointer(&mut self, coarse: bool) {
        if coarse && !self.coarse_pointer && self.brush_size == BRUSH_SIZE_DEFAULT {
            self.brush_size = BRUSH_SIZE_COARSE_DEFAULT;
        }
        self.coarse_pointer = coarse;
    }

    pub fn mode(&self) -> ResolutionMode {
        ResolutionMode::from_hd(self.use_hd)
    }

    /// Working image size limit for `mode`
    pub fn max_working_size(&self, mode: ResolutionMode) -> u32 {
        match mode {
            ResolutionMode::Standard => self.resize_ld,
            ResolutionMode::Hd => self.resize_hd,
        }
    }

    pub fn set_brush_size(&mut self, size: f32) {
        if size.is_finite() {
            self.brush_size = size.clamp(BRUSH_SIZE_MIN, BRUSH_SIZE_MAX);
        }
    }

    /// Reject values no session could work with
    pub fn validate(&self) -> PersistenceResult<()> {
        if !(BRUSH_SIZE_MIN..=BRUSH_SIZE_MAX).contains(&self.brush_size) {
            return Err(PersistenceError::InvalidSettings(format!(
                "brush size {} outside {BRUSH_SIZE_MIN}..={BRUSH_SIZE_MAX}",
                self.brush_size
            )));
        }
        if self.resize_ld == 0 || self.resize_hd == 0 || self.upload_max_size == 0 {
            return Err(PersistenceError::InvalidSettings("size limits must be positive".into()));
        }
        Ok(())
    }

    pub fn to_json(&self) -> PersistenceResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> PersistenceResult<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coarse_pointer_grows_default_brush() {
        let mut settings = EditorSettings::default();
        settings.set_coarse_pointer(true);
        assert_eq!(settings.brush_size, BRUSH_SIZE_COARSE_DEFAULT);
        assert!(settings.coarse_pointer);
        assert_eq!(settings.max_working_size(ResolutionMode::Standard), RESIZE_LD);
        assert_eq!(settings.max_working_size(ResolutionMode::Hd), RESIZE_HD);
    }

    #[test]
    fn test_coarse_pointer_keeps_chosen_brush() {
        let mut settings = EditorSettings::default();
        settings.set_brush_size(120.0);
        settings.set_coarse_pointer(true);
        assert_eq!(settings.brush_size, 120.0);

        // Only the first switch applies the coarse default
        let mut settings = EditorSettings::default();
        settings.set_coarse_pointer(true);
        settings.set_brush_size(BRUSH_SIZE_DEFAULT);
        settings.set_coarse_pointer(true);
        assert_eq!(settings.brush_size, BRUSH_SIZE_DEFAULT);
    }

    #[test]
    fn test_brush_size_is_clamped() {
        let mut settings = EditorSettings::default();
        settings.set_brush_size(5.0);
        assert_eq!(settings.brush_size, BRUSH_SIZE_MIN);
        settings.set_brush_size(500.0);
        assert_eq!(settings.brush_size, BRUSH_SIZE_MAX);
        settings.set_brush_size(f32::NAN);
        assert_eq!(settings.brush_size, BRUSH_SIZE_MAX);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{ "use_hd": true, "refiner": "none" }"#;
        let settings = EditorSettings::from_json(json).unwrap();
        assert!(settings.use_hd);
        assert_eq!(settings.refiner, RefinerType::None);
        assert_eq!(settings.brush_size, BRUSH_SIZE_DEFAULT);
    }

    #[test]
    fn test_out_of_range_json_is_rejected() {
        let result = EditorSettings::from_json(r#"{ "brush_size": 3.0 }"#);
        assert!(matches!(result, Err(PersistenceError::InvalidSettings(_))));
    }

    #[test]
    fn test_json_round_trip() {
        let mut settings = EditorSettings::default();
        settings.set_coarse_pointer(true);
        settings.use_hd = true;
        let json = settings.to_json().unwrap();
        assert_eq!(EditorSettings::from_json(&json).unwrap(), settings);
    }
}
