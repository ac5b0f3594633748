use egui::{Color32, ColorImage, Context, Painter, Rect, Shape, TextureHandle, TextureOptions};
use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::error::EditorResult;
use crate::history::EditHistory;
use crate::image::SourceImage;
use crate::input::Viewport;
use crate::raster::{BRUSH_COLOR, BRUSH_RGBA, mask, surface_pool};
use crate::state::EditorSession;
use crate::stroke::Stroke;

/// Strokes not yet baked into the latest render: everything from the batch holding that
/// render onward, or every stroke when nothing has been rendered
pub fn pending_strokes(history: &EditHistory) -> impl Iterator<Item = &Stroke> {
    let first = history.latest_render().map_or(0, |(index, _)| index);
    history.batches()[first..]
        .iter()
        .flat_map(|batch| batch.strokes().iter())
}

/// What the preview is painted over: the latest render, or the working image
pub fn background<'a>(source: &'a SourceImage, history: &'a EditHistory) -> &'a RgbaImage {
    match history.latest_render() {
        Some((_, render)) => render.pixels(),
        None => source.working(),
    }
}

/// Live preview at working resolution: the background with pending strokes in the brush color
pub fn preview(source: &SourceImage, history: &EditHistory) -> EditorResult<RgbaImage> {
    let (width, height) = source.working_dimensions();
    let base = background(source, history);

    surface_pool::with_scratch_surface(width, height, |surface| {
        if base.dimensions() == (width, height) {
            surface.copy_from_slice(base.as_raw());
        } else {
            let scaled = imageops::resize(base, width, height, FilterType::Triangle);
            surface.copy_from_slice(scaled.as_raw());
        }
        mask::paint_strokes(pending_strokes(history), surface, BRUSH_RGBA);
        surface.clone()
    })
}

pub fn to_color_image(image: &RgbaImage) -> ColorImage {
    let size = [image.width() as usize, image.height() as usize];
    ColorImage::from_rgba_unmultiplied(size, image.as_raw())
}

/// Identifies a background texture: one per history generation and latest render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BackgroundKey {
    generation: u64,
    render: Option<usize>,
}

/// Draws the canvas: the background as a cached texture, pending strokes as vector shapes
pub struct Renderer {
    ctx: Context,
    background: Option<(BackgroundKey, TextureHandle)>,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("background", &self.background.as_ref().map(|(key, _)| *key))
            .finish()
    }
}

impl Renderer {
    pub fn new(ctx: Context) -> Self {
        Self {
            ctx,
            background: None,
        }
    }

    /// Drop the cached texture
    pub fn invalidate(&mut self) {
        self.background = None;
    }

    fn background_texture(&mut self, session: &EditorSession) -> Option<&TextureHandle> {
        let source = session.image()?;
        let history = session.history();
        let key = BackgroundKey {
            generation: session.generation(),
            render: history.latest_render().map(|(_, render)| render.id()),
        };

        let stale = self.background.as_ref().is_none_or(|(cached, _)| *cached != key);
        if stale {
            log::debug!("Uploading background texture {key:?}");
            let image = to_color_image(background(source, history));
            let handle = self
                .ctx
                .load_texture("inpaint-background", image, TextureOptions::LINEAR);
            self.background = Some((key, handle));
        }
        self.background.as_ref().map(|(_, handle)| handle)
    }

    /// Paint the session's image and pending strokes into `canvas`
    pub fn render(
        &mut self,
        painter: &Painter,
        canvas: Rect,
        session: &EditorSession,
        viewport: &Viewport,
    ) {
        let Some(source) = session.image() else {
            self.invalidate();
            return;
        };
        let (width, height) = source.working_dimensions();
        let image_rect = viewport.image_rect(canvas, width as f32, height as f32);
        let uv = Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));

        if let Some(texture) = self.background_texture(session) {
            painter.image(texture.id(), image_rect, uv, Color32::WHITE);
        }

        for stroke in pending_strokes(session.history()) {
            paint_stroke(painter, stroke, canvas, viewport);
        }
    }
}

fn paint_stroke(painter: &Painter, stroke: &Stroke, canvas: Rect, viewport: &Viewport) {
    let Some(width) = stroke.width() else {
        return;
    };
    let screen_width = width * viewport.zoom();
    let points: Vec<egui::Pos2> = stroke
        .points()
        .iter()
        .map(|point| viewport.image_to_screen(canvas, *point))
        .collect();

    // Round caps
    for point in [points.first(), points.last()].into_iter().flatten() {
        painter.circle_filled(*point, screen_width / 2.0, BRUSH_COLOR);
    }
    if points.len() > 1 {
        painter.add(Shape::line(points, egui::Stroke::new(screen_width, BRUSH_COLOR)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::RenderedImage;
    use crate::state::ResolutionMode;
    use egui::pos2;
    use image::Rgba;

    fn draw(history: &mut EditHistory, x: f32) {
        history.begin_stroke(4.0, ResolutionMode::Hd, false);
        history.append_point(pos2(x, 5.0));
        history.append_point(pos2(x, 15.0));
        history.end_stroke();
        history.push_empty_stroke();
    }

    #[test]
    fn test_pending_strokes_start_at_latest_render() {
        let mut history = EditHistory::new();
        draw(&mut history, 3.0);
        assert_eq!(pending_strokes(&history).filter(|s| !s.is_empty()).count(), 1);

        let marker = history.marker();
        history.append_render(RenderedImage::new_ref(RgbaImage::new(20, 20)), marker);
        assert_eq!(pending_strokes(&history).filter(|s| !s.is_empty()).count(), 0);

        draw(&mut history, 12.0);
        assert_eq!(pending_strokes(&history).filter(|s| !s.is_empty()).count(), 1);
    }

    #[test]
    fn test_preview_paints_pending_strokes_over_background() {
        let working = RgbaImage::from_pixel(20, 20, Rgba([0, 0, 0, 255]));
        let source = SourceImage::from_rgba("a.png", working, 720).unwrap();
        let mut history = EditHistory::new();
        draw(&mut history, 5.0);

        let out = preview(&source, &history).unwrap();
        let painted = out.get_pixel(5, 10);
        assert_ne!(*painted, Rgba([0, 0, 0, 255]));
        assert!(painted.0[1] > painted.0[0]);
        assert_eq!(*out.get_pixel(15, 10), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_preview_uses_latest_render_as_background() {
        let source = SourceImage::from_rgba("a.png", RgbaImage::new(10, 10), 720).unwrap();
        let mut history = EditHistory::new();
        draw(&mut history, 2.0);
        let marker = history.marker();
        // A render at a different size is scaled to the working image
        let render = RgbaImage::from_pixel(20, 20, Rgba([1, 2, 3, 255]));
        history.append_render(RenderedImage::new_ref(render), marker);

        let out = preview(&source, &history).unwrap();
        assert_eq!(out.dimensions(), (10, 10));
        assert!(out.pixels().all(|p| *p == Rgba([1, 2, 3, 255])));
    }

    #[test]
    fn test_color_image_size() {
        let image = to_color_image(&RgbaImage::new(7, 3));
        assert_eq!(image.size, [7, 3]);
    }
}
