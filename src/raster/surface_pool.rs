//! Process-wide scratch surfaces shared by every rasterization and composite pass.
//!
//! Each surface is handed out already resized to the requested dimensions and cleared,
//! so content from a previous image never shows through. Lock order is mask before
//! scratch; nothing takes them the other way round.

use image::{GrayImage, RgbaImage};
use parking_lot::Mutex;

use crate::error::{EditorError, EditorResult};

static MASK_SURFACE: Mutex<Option<GrayImage>> = Mutex::new(None);
static SCRATCH_SURFACE: Mutex<Option<RgbaImage>> = Mutex::new(None);

/// Run `f` with the shared mask surface, sized `width` x `height` and cleared to zero
pub fn with_mask_surface<R>(
    width: u32,
    height: u32,
    f: impl FnOnce(&mut GrayImage) -> R,
) -> EditorResult<R> {
    check_dimensions(width, height)?;
    let mut slot = MASK_SURFACE.lock();
    let reusable = slot
        .as_ref()
        .is_some_and(|surface| surface.dimensions() == (width, height));
    if !reusable {
        log::debug!("Allocating {width}x{height} mask surface");
        *slot = Some(GrayImage::new(width, height));
    }
    let surface = slot.get_or_insert_with(|| GrayImage::new(width, height));
    surface.fill(0);
    Ok(f(surface))
}

/// Run `f` with the shared RGBA scratch surface, sized and cleared to transparent
pub fn with_scratch_surface<R>(
    width: u32,
    height: u32,
    f: impl FnOnce(&mut RgbaImage) -> R,
) -> EditorResult<R> {
    check_dimensions(width, height)?;
    let mut slot = SCRATCH_SURFACE.lock();
    let reusable = slot
        .as_ref()
        .is_some_and(|surface| surface.dimensions() == (width, height));
    if !reusable {
        log::debug!("Allocating {width}x{height} scratch surface");
        *slot = Some(RgbaImage::new(width, height));
    }
    let surface = slot.get_or_insert_with(|| RgbaImage::new(width, height));
    surface.fill(0);
    Ok(f(surface))
}

/// Release both surfaces, e.g. when the image is closed
pub fn release() {
    MASK_SURFACE.lock().take();
    SCRATCH_SURFACE.lock().take();
}

fn check_dimensions(width: u32, height: u32) -> EditorResult<()> {
    if width == 0 || height == 0 {
        log::error!("Refusing to hand out a {width}x{height} surface");
        return Err(EditorError::InvalidDimensions(width, height));
    }
    Ok(())
}
