use image::imageops::{self, FilterType};
use image::{GrayImage, Rgba, RgbaImage};

use crate::error::{EditorError, EditorResult};
use crate::history::EditHistory;
use crate::image::SourceImage;
use crate::raster::{mask, surface_pool};

/// Merge a render into the original image wherever the mask is painted.
///
/// `mask` and `render` may be at any resolution (usually the working one); both are
/// scaled to the original's native size before blending so the result has no seams
/// when the working canvas was downscaled. Pixels the scaled mask leaves at zero keep
/// the original value exactly; partially covered edge pixels are interpolated.
pub fn composite(
    original: &RgbaImage,
    mask: &GrayImage,
    render: &RgbaImage,
) -> EditorResult<RgbaImage> {
    let (width, height) = original.dimensions();
    for (w, h) in [mask.dimensions(), render.dimensions()] {
        if w == 0 || h == 0 {
            return Err(EditorError::InvalidDimensions(w, h));
        }
    }

    let mask = scale_to(mask, width, height);
    let render = scale_to(render, width, height);

    surface_pool::with_scratch_surface(width, height, |out| {
        for (x, y, pixel) in out.enumerate_pixels_mut() {
            let base = original.get_pixel(x, y);
            *pixel = match mask.get_pixel(x, y).0[0] {
                0 => *base,
                255 => *render.get_pixel(x, y),
                coverage => mix(*base, *render.get_pixel(x, y), coverage),
            };
        }
        out.clone()
    })
}

/// Composite the latest render in `history` over the source's full-resolution original.
///
/// Fails with [`EditorError::NoRender`] when nothing has been rendered yet.
pub fn composite_history(source: &SourceImage, history: &EditHistory) -> EditorResult<RgbaImage> {
    let Some((_, render)) = history.latest_render() else {
        log::error!("Composite requested before any render");
        return Err(EditorError::NoRender);
    };

    let (width, height) = source.working_dimensions();
    surface_pool::with_mask_surface(width, height, |surface| {
        mask::rasterize_into(history, surface);
        composite(source.original(), surface, render.pixels())
    })?
}

fn scale_to<P>(
    img: &image::ImageBuffer<P, Vec<u8>>,
    width: u32,
    height: u32,
) -> image::ImageBuffer<P, Vec<u8>>
where
    P: image::Pixel<Subpixel = u8> + 'static,
{
    if img.dimensions() == (width, height) {
        img.clone()
    } else {
        imageops::resize(img, width, height, FilterType::Triangle)
    }
}

fn mix(base: Rgba<u8>, over: Rgba<u8>, coverage: u8) -> Rgba<u8> {
    let t = coverage as u32;
    let lerp = |a: u8, b: u8| ((a as u32 * (255 - t) + b as u32 * t + 127) / 255) as u8;
    Rgba([
        lerp(base.0[0], over.0[0]),
        lerp(base.0[1], over.0[1]),
        lerp(base.0[2], over.0[2]),
        lerp(base.0[3], over.0[3]),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::RenderedImage;
    use crate::state::ResolutionMode;
    use egui::pos2;
    use image::Luma;

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| Rgba([x as u8, y as u8, (x ^ y) as u8, 255]))
    }

    #[test]
    fn test_empty_mask_keeps_original_exactly() {
        let original = gradient(100, 100);
        let render = RgbaImage::from_pixel(100, 100, Rgba([250, 0, 0, 255]));
        let out = composite(&original, &GrayImage::new(100, 100), &render).unwrap();
        assert_eq!(out, original);
    }

    #[test]
    fn test_full_mask_takes_render() {
        let original = gradient(20, 20);
        let render = RgbaImage::from_pixel(20, 20, Rgba([9, 8, 7, 255]));
        let full = GrayImage::from_pixel(20, 20, Luma([255]));
        let out = composite(&original, &full, &render).unwrap();
        assert!(out.pixels().all(|p| *p == Rgba([9, 8, 7, 255])));
    }

    #[test]
    fn test_low_resolution_inputs_are_scaled_to_original() {
        let original = gradient(80, 40);
        let render = RgbaImage::from_pixel(20, 10, Rgba([0, 0, 255, 255]));
        // Left half painted at working resolution
        let half = GrayImage::from_fn(20, 10, |x, _| Luma([if x < 10 { 255 } else { 0 }]));
        let out = composite(&original, &half, &render).unwrap();

        assert_eq!(out.dimensions(), (80, 40));
        assert_eq!(*out.get_pixel(5, 20), Rgba([0, 0, 255, 255]));
        assert_eq!(out.get_pixel(75, 20), original.get_pixel(75, 20));
    }

    #[test]
    fn test_composite_history_without_render_fails() {
        let source = SourceImage::from_rgba("a.png", gradient(10, 10), 720).unwrap();
        let result = composite_history(&source, &EditHistory::new());
        assert!(matches!(result, Err(EditorError::NoRender)));
    }

    #[test]
    fn test_composite_history_outside_strokes_is_untouched() {
        let original = gradient(64, 64);
        let source = SourceImage::from_rgba("a.png", original.clone(), 720).unwrap();

        let mut history = EditHistory::new();
        history.begin_stroke(6.0, ResolutionMode::Hd, false);
        history.append_point(pos2(10.0, 10.0));
        history.append_point(pos2(20.0, 10.0));
        history.end_stroke();
        let marker = history.marker();
        history.append_render(
            RenderedImage::new_ref(RgbaImage::from_pixel(64, 64, Rgba([0, 255, 0, 255]))),
            marker,
        );

        let out = composite_history(&source, &history).unwrap();
        assert_eq!(*out.get_pixel(15, 10), Rgba([0, 255, 0, 255]));
        assert_eq!(out.get_pixel(50, 50), original.get_pixel(50, 50));
    }
}
