use egui::{Context, PointerButton, Pos2, Rect, Vec2};

mod router;
mod viewport;

pub use router::route_event;
pub use viewport::{MAX_ZOOM, MIN_ZOOM, Viewport};

/// Canvas input, in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Primary button pressed over the canvas
    PointerDown { position: Pos2 },
    /// Pointer moved while the primary button is held
    PointerMove { position: Pos2 },
    /// Primary button released
    PointerUp,
    /// Pinch or ctrl+scroll
    Zoom { anchor: Pos2, factor: f32 },
    /// Secondary or middle drag
    Pan { delta: Vec2 },
}

/// Turns raw egui input into canvas `InputEvent`s
#[derive(Debug, Default)]
pub struct InputHandler {
    dragging: bool,
    touch_seen: bool,
}

impl InputHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once a touch has been seen; such devices get coarse-pointer behavior
    pub fn touch_seen(&self) -> bool {
        self.touch_seen
    }

    /// Process this frame's input for a canvas occupying `canvas`
    pub fn process_input(&mut self, ctx: &Context, canvas: Rect) -> Vec<InputEvent> {
        let mut events = Vec::new();

        ctx.input(|input| {
            if input.any_touches() {
                self.touch_seen = true;
            }

            let hover = input.pointer.hover_pos();
            let over_canvas = hover.is_some_and(|pos| canvas.contains(pos));

            if input.pointer.button_pressed(PointerButton::Primary) && over_canvas {
                if let Some(position) = hover {
                    self.dragging = true;
                    events.push(InputEvent::PointerDown { position });
                }
            } else if self.dragging && input.pointer.delta() != Vec2::ZERO {
                if let Some(position) = hover {
                    events.push(InputEvent::PointerMove { position });
                }
            }

            if self.dragging && !input.pointer.primary_down() {
                self.dragging = false;
                events.push(InputEvent::PointerUp);
            }

            if let Some(anchor) = hover.filter(|_| over_canvas) {
                let factor = input.zoom_delta();
                if factor != 1.0 {
                    events.push(InputEvent::Zoom { anchor, factor });
                }
            }

            let panning = input.pointer.button_down(PointerButton::Secondary)
                || input.pointer.button_down(PointerButton::Middle);
            if panning && over_canvas && input.pointer.delta() != Vec2::ZERO {
                events.push(InputEvent::Pan {
                    delta: input.pointer.delta(),
                });
            }
        });

        events
    }
}
