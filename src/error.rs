use thiserror::Error;

/// Errors raised by the editing core.
///
/// Most variants are caller programming errors (no image open, compositing before any
/// render, a second render trigger while one is in flight). They are reported loudly
/// and never leave the edit history half-mutated.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("no image is open")]
    NoImage,

    #[error("no render exists yet")]
    NoRender,

    #[error("nothing has been painted yet")]
    NothingToRender,

    #[error("a render is already in flight")]
    RenderInFlight,

    #[error("no render is in flight")]
    NoRenderInFlight,

    #[error("cannot transition from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },

    #[error("invalid surface dimensions {0}x{1}")]
    InvalidDimensions(u32, u32),

    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),
}

/// Result type for core operations
pub type EditorResult<T> = Result<T, EditorError>;
