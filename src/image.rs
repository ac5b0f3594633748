use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, RgbaImage};

use crate::error::{EditorError, EditorResult};

// Static counter for generating unique render IDs
static NEXT_RENDER_ID: AtomicUsize = AtomicUsize::new(1);

/// Image returned by one remote render, at working resolution
#[derive(Clone)]
pub struct RenderedImage {
    id: usize,
    pixels: RgbaImage,
}

// Define a reference-counted type alias for RenderedImage
pub type RenderRef = Arc<RenderedImage>;

impl std::fmt::Debug for RenderedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderedImage")
            .field("id", &self.id)
            .field("dimensions", &self.pixels.dimensions())
            .finish()
    }
}

impl RenderedImage {
    pub fn new(pixels: RgbaImage) -> Self {
        let id = NEXT_RENDER_ID.fetch_add(1, Ordering::SeqCst);
        Self { id, pixels }
    }

    pub fn new_ref(pixels: RgbaImage) -> RenderRef {
        Arc::new(Self::new(pixels))
    }

    /// Decode the bytes returned by the inpainting service
    pub fn decode(bytes: &[u8]) -> EditorResult<Self> {
        let pixels = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = pixels.dimensions();
        if width == 0 || height == 0 {
            return Err(EditorError::InvalidDimensions(width, height));
        }
        Ok(Self::new(pixels))
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }
}

/// The image being edited: the full-resolution original plus the working copy the
/// user paints on and the remote service receives.
#[derive(Clone)]
pub struct SourceImage {
    name: String,
    format: ImageFormat,
    original: Arc<RgbaImage>,
    working: Arc<RgbaImage>,
    working_bytes: Arc<Vec<u8>>,
}

impl std::fmt::Debug for SourceImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceImage")
            .field("name", &self.name)
            .field("format", &self.format)
            .field("original", &self.original.dimensions())
            .field("working", &self.working.dimensions())
            .finish()
    }
}

impl SourceImage {
    /// Decode an uploaded file. The working copy is downscaled so its longer side is at
    /// most `max_size`; the original keeps its native resolution.
    pub fn decode(name: impl Into<String>, bytes: &[u8], max_size: u32) -> EditorResult<Self> {
        let format = image::guess_format(bytes)?;
        let original = image::load_from_memory_with_format(bytes, format)?.to_rgba8();
        Self::build(name.into(), format, Arc::new(original), Some(bytes), max_size)
    }

    /// Build from already decoded pixels. The format is guessed from the file name.
    pub fn from_rgba(
        name: impl Into<String>,
        original: RgbaImage,
        max_size: u32,
    ) -> EditorResult<Self> {
        let name = name.into();
        let format = ImageFormat::from_path(&name).unwrap_or(ImageFormat::Png);
        Self::build(name, format, Arc::new(original), None, max_size)
    }

    /// Re-derive the working copy from the original with a new size limit
    pub fn resized(&self, max_size: u32) -> EditorResult<Self> {
        Self::build(self.name.clone(), self.format, self.original.clone(), None, max_size)
    }

    fn build(
        name: String,
        format: ImageFormat,
        original: Arc<RgbaImage>,
        bytes: Option<&[u8]>,
        max_size: u32,
    ) -> EditorResult<Self> {
        let (width, height) = original.dimensions();
        if width == 0 || height == 0 {
            return Err(EditorError::InvalidDimensions(width, height));
        }

        let (working, working_bytes) = match resize_to_max(&original, max_size) {
            Some(resized) => {
                log::debug!(
                    "Downscaled {} from {}x{} to {}x{}",
                    name,
                    width,
                    height,
                    resized.width(),
                    resized.height()
                );
                let bytes = encode(&resized, format)?;
                (Arc::new(resized), bytes)
            }
            None => {
                let bytes = match bytes {
                    Some(bytes) if encoding_format(format) == format => bytes.to_vec(),
                    _ => encode(&original, format)?,
                };
                (original.clone(), bytes)
            }
        };

        Ok(Self {
            name,
            format,
            original,
            working,
            working_bytes: Arc::new(working_bytes),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// MIME type of the bytes in `working_bytes`
    pub fn mime(&self) -> &'static str {
        encoding_format(self.format).to_mime_type()
    }

    pub fn original(&self) -> &RgbaImage {
        &self.original
    }

    pub fn working(&self) -> &RgbaImage {
        &self.working
    }

    /// Encoded working image, as sent to the inpainting service
    pub fn working_bytes(&self) -> &[u8] {
        &self.working_bytes
    }

    /// Shared handle to the encoded working image, for requests that outlive `self`
    pub fn working_bytes_shared(&self) -> Arc<Vec<u8>> {
        Arc::clone(&self.working_bytes)
    }

    pub fn is_downscaled(&self) -> bool {
        self.original.dimensions() != self.working.dimensions()
    }

    pub fn working_dimensions(&self) -> (u32, u32) {
        self.working.dimensions()
    }

    pub fn original_dimensions(&self) -> (u32, u32) {
        self.original.dimensions()
    }
}

/// Dimensions after fitting the longer side into `max_size`, preserving aspect ratio
pub fn fitted_dimensions(width: u32, height: u32, max_size: u32) -> (u32, u32) {
    let max_size = max_size.max(1);
    if width > height {
        if width > max_size {
            let scaled = (height as f64 * max_size as f64 / width as f64).floor() as u32;
            return (max_size, scaled.max(1));
        }
    } else if height > max_size {
        let scaled = (width as f64 * max_size as f64 / height as f64).floor() as u32;
        return (scaled.max(1), max_size);
    }
    (width, height)
}

/// True when either side exceeds `limit`
pub fn needs_downscale(width: u32, height: u32, limit: u32) -> bool {
    width > limit || height > limit
}

/// Downscale so the longer side is at most `max_size`. `None` when it already fits.
pub fn resize_to_max(img: &RgbaImage, max_size: u32) -> Option<RgbaImage> {
    let (width, height) = img.dimensions();
    let (new_width, new_height) = fitted_dimensions(width, height, max_size);
    if (new_width, new_height) == (width, height) {
        return None;
    }
    Some(imageops::resize(img, new_width, new_height, FilterType::Triangle))
}

/// Format actually written for a source format: JPEG stays JPEG, everything else is PNG
pub fn encoding_format(format: ImageFormat) -> ImageFormat {
    match format {
        ImageFormat::Jpeg => ImageFormat::Jpeg,
        _ => ImageFormat::Png,
    }
}

/// Encode pixels in the format used for `format`
pub fn encode(img: &RgbaImage, format: ImageFormat) -> EditorResult<Vec<u8>> {
    let mut bytes = Vec::new();
    match encoding_format(format) {
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgba8(img.clone()).to_rgb8();
            rgb.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)?;
        }
        other => img.write_to(&mut Cursor::new(&mut bytes), other)?,
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_fitted_dimensions_landscape() {
        assert_eq!(fitted_dimensions(3000, 1500, 720), (720, 360));
        assert_eq!(fitted_dimensions(700, 300, 720), (700, 300));
    }

    #[test]
    fn test_fitted_dimensions_portrait_and_square() {
        assert_eq!(fitted_dimensions(1000, 2000, 720), (360, 720));
        assert_eq!(fitted_dimensions(1000, 1000, 720), (720, 720));
    }

    #[test]
    fn test_source_image_keeps_original() {
        let original = RgbaImage::from_pixel(1440, 720, Rgba([10, 20, 30, 255]));
        let source = SourceImage::from_rgba("photo.png", original, 720).unwrap();
        assert_eq!(source.original_dimensions(), (1440, 720));
        assert_eq!(source.working_dimensions(), (720, 360));
        assert!(source.is_downscaled());
        assert_eq!(source.mime(), "image/png");

        let decoded = image::load_from_memory(source.working_bytes()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (720, 360));
    }

    #[test]
    fn test_source_image_rejects_empty() {
        let result = SourceImage::from_rgba("empty.png", RgbaImage::new(0, 0), 720);
        assert!(matches!(result, Err(EditorError::InvalidDimensions(0, 0))));
    }

    #[test]
    fn test_render_ids_are_unique() {
        let a = RenderedImage::new(RgbaImage::new(1, 1));
        let b = RenderedImage::new(RgbaImage::new(1, 1));
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_jpeg_encoding_drops_alpha() {
        let img = RgbaImage::from_pixel(8, 8, Rgba([200, 100, 50, 128]));
        let bytes = encode(&img, ImageFormat::Jpeg).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
    }
}
