use egui::{Pos2, Rect, Vec2};

pub const MIN_ZOOM: f32 = 0.05;
pub const MAX_ZOOM: f32 = 20.0;

/// Maps between screen space and image pixel space.
///
/// The image's top-left corner sits at `canvas.min + offset` and one image pixel spans
/// `zoom` screen points. Strokes are stored in image space, so they stay put whatever
/// the zoom or pan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    zoom: f32,
    offset: Vec2,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            offset: Vec2::ZERO,
        }
    }
}

impl Viewport {
    /// Centered, scaled so the whole image fits in `canvas`
    pub fn fit(canvas: Rect, width: f32, height: f32) -> Self {
        if width <= 0.0 || height <= 0.0 || canvas.width() <= 0.0 || canvas.height() <= 0.0 {
            return Self::default();
        }
        let zoom = (canvas.width() / width)
            .min(canvas.height() / height)
            .clamp(MIN_ZOOM, MAX_ZOOM);
        let offset = (canvas.size() - Vec2::new(width, height) * zoom) / 2.0;
        Self { zoom, offset }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn screen_to_image(&self, canvas: Rect, pos: Pos2) -> Pos2 {
        let local = pos - canvas.min - self.offset;
        Pos2::new(local.x / self.zoom, local.y / self.zoom)
    }

    pub fn image_to_screen(&self, canvas: Rect, pos: Pos2) -> Pos2 {
        canvas.min + self.offset + pos.to_vec2() * self.zoom
    }

    /// Screen rect covered by a `width` x `height` image
    pub fn image_rect(&self, canvas: Rect, width: f32, height: f32) -> Rect {
        Rect::from_min_max(
            self.image_to_screen(canvas, Pos2::ZERO),
            self.image_to_screen(canvas, Pos2::new(width, height)),
        )
    }

    /// Zoom by `factor`, keeping the image point under `anchor` in place
    pub fn zoom_around(&mut self, canvas: Rect, anchor: Pos2, factor: f32) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let fixed = self.screen_to_image(canvas, anchor);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.offset = anchor - canvas.min - fixed.to_vec2() * self.zoom;
    }

    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }
}
