use std::io::Cursor;

use egui::Color32;
use image::{GrayImage, ImageFormat, Luma, Rgba, RgbaImage};

use crate::error::EditorResult;
use crate::geometry::{self, distance_to_line_segment};
use crate::history::EditHistory;
use crate::stroke::Stroke;

/// Mask value for painted pixels. Unpainted pixels are 0.
pub const MASK_COVERED: u8 = 255;

/// On-screen color of strokes that have not been rendered yet
pub const BRUSH_COLOR: Color32 = Color32::from_rgba_premultiplied(142, 191, 1, 191);

/// Unpremultiplied RGBA of [`BRUSH_COLOR`]: `rgba(189, 255, 1, 0.75)`
pub const BRUSH_RGBA: [u8; 4] = [189, 255, 1, 191];

/// Rasterize every stroke of every batch, in order, onto a fresh binary mask.
///
/// The result only separates painted from unpainted pixels; replaying the same history
/// always yields the same surface.
pub fn rasterize(history: &EditHistory, width: u32, height: u32) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    rasterize_into(history, &mut mask);
    mask
}

/// Rasterize onto an existing surface, clearing it first
pub fn rasterize_into(history: &EditHistory, mask: &mut GrayImage) {
    mask.fill(0);
    draw_coverage(history.all_strokes(), mask);
}

/// Mark every pixel covered by `strokes` as painted
pub fn draw_coverage<'a>(strokes: impl IntoIterator<Item = &'a Stroke>, mask: &mut GrayImage) {
    let (width, height) = mask.dimensions();
    for stroke in strokes {
        for_each_covered_pixel(stroke, width, height, |x, y| {
            mask.put_pixel(x, y, Luma([MASK_COVERED]));
        });
    }
}

/// Paint strokes over `target` in `color`, blending each stroke once.
///
/// Overlapping segments of one stroke do not darken each other; separate strokes do,
/// the way consecutive canvas stroke calls stack.
pub fn paint_strokes<'a>(
    strokes: impl IntoIterator<Item = &'a Stroke>,
    target: &mut RgbaImage,
    color: [u8; 4],
) {
    let (width, height) = target.dimensions();
    for stroke in strokes {
        let Some(bounds) = stroke.bounds() else {
            continue;
        };
        let Some((min_x, min_y, max_x, max_y)) = geometry::pixel_span(bounds, width, height) else {
            continue;
        };

        let span_width = (max_x - min_x) as usize;
        let mut covered = vec![false; span_width * (max_y - min_y) as usize];
        for_each_covered_pixel(stroke, width, height, |x, y| {
            covered[(y - min_y) as usize * span_width + (x - min_x) as usize] = true;
        });

        for (index, _) in covered.iter().enumerate().filter(|(_, hit)| **hit) {
            let x = min_x + (index % span_width) as u32;
            let y = min_y + (index / span_width) as u32;
            let pixel = target.get_pixel_mut(x, y);
            *pixel = blend_over(*pixel, color);
        }
    }
}

/// Encode a mask as the PNG the inpainting service expects: white marks the parts to remove
pub fn encode_mask_png(mask: &GrayImage) -> EditorResult<Vec<u8>> {
    let mut bytes = Vec::new();
    mask.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Count of painted pixels
pub fn coverage(mask: &GrayImage) -> usize {
    mask.pixels().filter(|pixel| pixel.0[0] > 0).count()
}

/// Calls `mark` once per segment for every pixel whose center lies within half the
/// stroke width of that segment. Round caps and joins fall out of the distance test.
fn for_each_covered_pixel(
    stroke: &Stroke,
    width: u32,
    height: u32,
    mut mark: impl FnMut(u32, u32),
) {
    let Some(stroke_width) = stroke.width() else {
        return;
    };
    let radius = stroke_width / 2.0;
    let points = stroke.points();
    if points.is_empty() {
        return;
    }

    // A single point paints a dot
    let segments: Vec<(egui::Pos2, egui::Pos2)> = if points.len() == 1 {
        vec![(points[0], points[0])]
    } else {
        points.windows(2).map(|pair| (pair[0], pair[1])).collect()
    };

    for (start, end) in segments {
        let bounds = geometry::calculate_bounds(&[start, end], radius);
        let Some((min_x, min_y, max_x, max_y)) = geometry::pixel_span(bounds, width, height) else {
            continue;
        };
        for y in min_y..max_y {
            for x in min_x..max_x {
                let center = egui::pos2(x as f32 + 0.5, y as f32 + 0.5);
                if distance_to_line_segment(center, start, end) <= radius {
                    mark(x, y);
                }
            }
        }
    }
}

/// Source-over blend of an unpremultiplied color onto an unpremultiplied pixel
fn blend_over(dst: Rgba<u8>, src: [u8; 4]) -> Rgba<u8> {
    let src_a = src[3] as f32 / 255.0;
    let dst_a = dst.0[3] as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let channel = |s: u8, d: u8| {
        let value = (s as f32 * src_a + d as f32 * dst_a * (1.0 - src_a)) / out_a;
        value.round().clamp(0.0, 255.0) as u8
    };
    Rgba([
        channel(src[0], dst.0[0]),
        channel(src[1], dst.0[1]),
        channel(src[2], dst.0[2]),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}
