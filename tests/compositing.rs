use eframe_inpaint::error::EditorError;
use eframe_inpaint::history::EditHistory;
use eframe_inpaint::image::{RenderedImage, SourceImage};
use eframe_inpaint::raster::{composite, composite_history, rasterize};
use eframe_inpaint::state::ResolutionMode;
use egui::pos2;
use image::{GrayImage, Rgba, RgbaImage};

fn photo(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x + y) % 256) as u8, 255])
    })
}

fn scribble(mode: ResolutionMode) -> EditHistory {
    let mut history = EditHistory::new();
    history.begin_stroke(5.0, mode, false);
    for (x, y) in [(3.0, 4.0), (20.0, 9.0), (12.0, 25.0)] {
        history.append_point(pos2(x, y));
    }
    history.end_stroke();
    history.push_empty_stroke();
    history
}

#[test]
fn test_empty_mask_composite_is_byte_identical() {
    let original = photo(100, 100);
    let render = RgbaImage::from_pixel(100, 100, Rgba([255, 0, 255, 255]));
    let out = composite(&original, &GrayImage::new(100, 100), &render).unwrap();
    assert_eq!(out.as_raw(), original.as_raw());
}

#[test]
fn test_rasterize_is_deterministic() {
    let history = scribble(ResolutionMode::Hd);
    let first = rasterize(&history, 32, 32);
    let second = rasterize(&history, 32, 32);
    assert_eq!(first, second);
}

#[test]
fn test_pixels_outside_mask_match_original_after_downscale() {
    let original = photo(300, 200);
    let source = SourceImage::from_rgba("wide.png", original.clone(), 30).unwrap();
    assert_eq!(source.working_dimensions(), (30, 20));

    let mut history = scribble(ResolutionMode::Hd);
    let marker = history.marker();
    history.append_render(
        RenderedImage::new_ref(RgbaImage::from_pixel(30, 20, Rgba([0, 0, 0, 255]))),
        marker,
    );

    let out = composite_history(&source, &history).unwrap();
    assert_eq!(out.dimensions(), (300, 200));

    // Scale the working mask up the same way and check every untouched pixel
    let mask = rasterize(&history, 30, 20);
    let scaled = image::imageops::resize(&mask, 300, 200, image::imageops::FilterType::Triangle);
    let mut untouched = 0;
    for (x, y, pixel) in out.enumerate_pixels() {
        if scaled.get_pixel(x, y).0[0] == 0 {
            assert_eq!(pixel, original.get_pixel(x, y));
            untouched += 1;
        }
    }
    assert!(untouched > 0);
}

#[test]
fn test_composite_without_render_is_an_error() {
    let source = SourceImage::from_rgba("a.png", photo(10, 10), 720).unwrap();
    let history = scribble(ResolutionMode::Standard);
    assert!(matches!(composite_history(&source, &history), Err(EditorError::NoRender)));
}

#[test]
fn test_stale_surface_does_not_leak_between_images() {
    // A large, heavily painted mask first
    let mut big = EditHistory::new();
    big.begin_stroke(200.0, ResolutionMode::Hd, false);
    big.append_point(pos2(50.0, 50.0));
    big.end_stroke();
    let big_source = SourceImage::from_rgba("big.png", photo(100, 100), 720).unwrap();
    let marker = big.marker();
    big.append_render(RenderedImage::new_ref(photo(100, 100)), marker);
    composite_history(&big_source, &big).unwrap();

    // Then a smaller image with an empty mask: nothing may change
    let small = photo(40, 40);
    let small_source = SourceImage::from_rgba("small.png", small.clone(), 720).unwrap();
    let mut empty = EditHistory::new();
    let marker = empty.marker();
    empty.append_render(
        RenderedImage::new_ref(RgbaImage::from_pixel(40, 40, Rgba([1, 1, 1, 255]))),
        marker,
    );
    let out = composite_history(&small_source, &empty).unwrap();
    assert_eq!(out, small);
}
