use egui::Rect;

use super::{InputEvent, Viewport};
use crate::error::EditorResult;
use crate::state::{EditorSession, StrokeOutcome};

/// Apply one canvas event to the session and viewport.
///
/// Returns the stroke outcome on pointer-up so the caller can start a render.
pub fn route_event(
    event: &InputEvent,
    session: &mut EditorSession,
    viewport: &mut Viewport,
    canvas: Rect,
) -> EditorResult<Option<StrokeOutcome>> {
    match *event {
        InputEvent::PointerDown { position } => {
            if session.image().is_some() {
                let point = viewport.screen_to_image(canvas, position);
                session.begin_stroke(point, viewport.zoom())?;
            }
        }
        InputEvent::PointerMove { position } => {
            session.append_point(viewport.screen_to_image(canvas, position));
        }
        InputEvent::PointerUp => return Ok(Some(session.end_stroke())),
        InputEvent::Zoom { anchor, factor } => viewport.zoom_around(canvas, anchor, factor),
        InputEvent::Pan { delta } => viewport.pan(delta),
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{EditorSettings, ResolutionMode};
    use egui::{pos2, vec2};
    use image::{Rgba, RgbaImage};

    fn canvas() -> Rect {
        Rect::from_min_size(pos2(0.0, 0.0), vec2(200.0, 200.0))
    }

    fn send(
        event: InputEvent,
        session: &mut EditorSession,
        viewport: &mut Viewport,
    ) -> Option<StrokeOutcome> {
        route_event(&event, session, viewport, canvas()).unwrap()
    }

    #[test]
    fn test_drag_becomes_stroke_in_image_space() {
        let mut session = EditorSession::new(EditorSettings {
            use_hd: true,
            ..EditorSettings::default()
        });
        session
            .open_rgba("a.png", RgbaImage::from_pixel(100, 100, Rgba([0, 0, 0, 255])))
            .unwrap();
        let mut viewport = Viewport::fit(canvas(), 100.0, 100.0);

        let down = InputEvent::PointerDown { position: pos2(20.0, 20.0) };
        let drag = InputEvent::PointerMove { position: pos2(60.0, 20.0) };
        send(down, &mut session, &mut viewport);
        send(drag, &mut session, &mut viewport);
        let outcome = send(InputEvent::PointerUp, &mut session, &mut viewport);

        assert_eq!(outcome, Some(StrokeOutcome::Pending));
        assert_eq!(session.mode(), ResolutionMode::Hd);
        let stroke = &session.history().current_editable().strokes()[0];
        assert_eq!(stroke.points(), &[pos2(10.0, 10.0), pos2(30.0, 10.0)]);
        // Brush size 50 at zoom 2
        assert_eq!(stroke.width(), Some(25.0));
    }

    #[test]
    fn test_pointer_events_without_image_are_ignored() {
        let mut session = EditorSession::new(EditorSettings::default());
        let mut viewport = Viewport::default();
        let down = InputEvent::PointerDown { position: pos2(5.0, 5.0) };
        send(down, &mut session, &mut viewport);
        let outcome = send(InputEvent::PointerUp, &mut session, &mut viewport);
        assert_eq!(outcome, Some(StrokeOutcome::Ignored));
        assert!(session.history().is_initial());
    }

    #[test]
    fn test_zoom_event_updates_viewport() {
        let mut session = EditorSession::new(EditorSettings::default());
        let mut viewport = Viewport::default();
        let zoom = InputEvent::Zoom {
            anchor: pos2(0.0, 0.0),
            factor: 2.0,
        };
        assert_eq!(send(zoom, &mut session, &mut viewport), None);
        assert_eq!(viewport.zoom(), 2.0);
    }
}
