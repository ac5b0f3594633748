use egui::{Pos2, Rect};

use crate::geometry;

/// One continuous brush drag.
///
/// Points are stored in unscaled image pixel space, so the stroke stays aligned with
/// the working image whatever the viewport zoom was when it was drawn. The width is
/// fixed when the stroke begins; a stroke that was never begun has no width and is
/// skipped by every rasterization pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Stroke {
    width: Option<f32>,
    points: Vec<Pos2>,
}

impl Stroke {
    /// Create an empty stroke, used as the placeholder for the next drag
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a finished stroke from a width and a point path
    pub fn with_points(width: f32, points: Vec<Pos2>) -> Self {
        let mut stroke = Self { width: None, points };
        stroke.set_width(width);
        stroke
    }

    /// The brush diameter in image pixels, if the stroke has been begun
    pub fn width(&self) -> Option<f32> {
        self.width
    }

    /// Fix the brush diameter. Non-positive or non-finite widths leave the stroke unset.
    pub fn set_width(&mut self, width: f32) {
        self.width = (width.is_finite() && width > 0.0).then_some(width);
    }

    pub fn points(&self) -> &[Pos2] {
        &self.points
    }

    pub fn add_point(&mut self, point: Pos2) {
        self.points.push(point);
    }

    /// True when no point has been recorded yet
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// True when the stroke leaves a mark: at least one point and a width
    pub fn is_paintable(&self) -> bool {
        !self.points.is_empty() && self.width.is_some()
    }

    /// Bounding box of the painted area, including the round caps
    pub fn bounds(&self) -> Option<Rect> {
        let width = self.width?;
        if self.points.is_empty() {
            return None;
        }
        Some(geometry::calculate_bounds(&self.points, width / 2.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    #[test]
    fn test_new_stroke_is_placeholder() {
        let stroke = Stroke::new();
        assert!(stroke.is_empty());
        assert!(!stroke.is_paintable());
        assert_eq!(stroke.width(), None);
        assert!(stroke.bounds().is_none());
    }

    #[test]
    fn test_invalid_width_is_ignored() {
        let mut stroke = Stroke::new();
        stroke.set_width(-3.0);
        assert_eq!(stroke.width(), None);
        stroke.set_width(f32::NAN);
        assert_eq!(stroke.width(), None);
        stroke.set_width(12.0);
        assert_eq!(stroke.width(), Some(12.0));
    }

    #[test]
    fn test_bounds_include_caps() {
        let stroke = Stroke::with_points(10.0, vec![pos2(20.0, 20.0), pos2(40.0, 30.0)]);
        let bounds = stroke.bounds().unwrap();
        assert_eq!(bounds.min, pos2(15.0, 15.0));
        assert_eq!(bounds.max, pos2(45.0, 35.0));
    }
}
