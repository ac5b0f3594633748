mod mode;
mod persistence;
mod render_state;
mod session;

pub use mode::{RefinerType, ResolutionMode};
pub use persistence::{
    BRUSH_SIZE_COARSE_DEFAULT, BRUSH_SIZE_DEFAULT, BRUSH_SIZE_MAX, BRUSH_SIZE_MIN,
    EditorSettings, PersistenceError, PersistenceResult, RESIZE_HD, RESIZE_LD,
    UPLOAD_MAX_SIZE,
};
pub use render_state::{RenderEvent, RenderState};
pub use session::{EditorSession, RenderJob, RenderOutcome, StrokeOutcome};
