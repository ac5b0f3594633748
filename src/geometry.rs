use egui::{Pos2, Rect};

/// Distance from a point to a line segment. A zero-length segment is a single point.
pub(crate) fn distance_to_line_segment(point: Pos2, line_start: Pos2, line_end: Pos2) -> f32 {
    let line_vec = line_end - line_start;
    let point_vec = point - line_start;

    let line_len = line_vec.length();
    if line_len == 0.0 {
        return point_vec.length();
    }

    let t = ((point_vec.x * line_vec.x + point_vec.y * line_vec.y) / line_len).clamp(0.0, line_len);
    let projection = line_start + (line_vec * t / line_len);
    (point - projection).length()
}

/// Calculate the bounding box for a set of points
pub(crate) fn calculate_bounds(points: &[Pos2], padding: f32) -> Rect {
    if points.is_empty() {
        return Rect::NOTHING;
    }

    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;

    for point in points {
        min_x = min_x.min(point.x);
        min_y = min_y.min(point.y);
        max_x = max_x.max(point.x);
        max_y = max_y.max(point.y);
    }

    Rect::from_min_max(
        Pos2::new(min_x - padding, min_y - padding),
        Pos2::new(max_x + padding, max_y + padding),
    )
}

/// Pixel range `[min, max)` covered by `rect`, clipped to a `width` x `height` surface.
/// Returns `None` when nothing of the rect lands on the surface.
pub(crate) fn pixel_span(rect: Rect, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
    let min_x = rect.min.x.floor().max(0.0) as u32;
    let min_y = rect.min.y.floor().max(0.0) as u32;
    let max_x = (rect.max.x.ceil().max(0.0) as u32).min(width);
    let max_y = (rect.max.y.ceil().max(0.0) as u32).min(height);

    (min_x < max_x && min_y < max_y).then_some((min_x, min_y, max_x, max_y))
}
