use crate::state::{RefinerType, ResolutionMode};

/// User-facing message for a failed render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alert {
    /// The service answered with HTTP 429
    RateLimited,
    Generic,
}

impl Alert {
    pub fn message(&self) -> &'static str {
        match self {
            Alert::RateLimited => "Too many requests. Please upgrade to Pro or try again later.",
            Alert::Generic => "Something went wrong. Please try again later or contact support.",
        }
    }
}

impl std::fmt::Display for Alert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    ImageOpened {
        name: String,
        width: u32,
        height: u32,
        downscaled: bool,
    },
    ImageClosed,
    HistoryReset,
    ModeChanged {
        old: ResolutionMode,
        new: ResolutionMode,
    },
    RefinerChanged(RefinerType),
    StrokeStarted {
        width: f32,
    },
    StrokeCompleted {
        points: usize,
    },
    RenderStarted {
        mode: ResolutionMode,
        refiner: RefinerType,
    },
    RenderSucceeded {
        duration_ms: u64,
        width: u32,
        height: u32,
    },
    RenderFailed {
        alert: Alert,
        status: Option<u16>,
    },
    Undo {
        batches: usize,
    },
    Exported {
        name: String,
        width: u32,
        height: u32,
    },
}

impl EditorEvent {
    /// Analytics name of the event, if it is one the product tracks
    pub fn analytics_name(&self) -> Option<&'static str> {
        match self {
            EditorEvent::RenderStarted { .. } => Some("inpaint_start"),
            EditorEvent::RenderSucceeded { .. } => Some("inpaint_processed"),
            EditorEvent::RenderFailed { .. } => Some("inpaint_failed"),
            EditorEvent::Exported { .. } => Some("download"),
            _ => None,
        }
    }
}
