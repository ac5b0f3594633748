//! Export of the edited image and the payload of the best-effort result upload.

use image::imageops::{self, FilterType};
use image::{ImageFormat, RgbaImage};

use crate::error::EditorResult;
use crate::history::EditHistory;
use crate::image::{self as codec, SourceImage};
use crate::raster::{composite_history, encode_mask_png, rasterize};
use crate::service::ResultUpload;
use crate::state::ResolutionMode;

const EXPORT_SUFFIX: &str = "_cleanup";

/// A finished export, ready to be written out
#[derive(Debug, Clone)]
pub struct ExportedImage {
    pub name: String,
    pub format: ImageFormat,
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// The mask used, as `mask.png`
    pub mask_png: Vec<u8>,
    pixels: RgbaImage,
}

impl ExportedImage {
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// Name of the exported file written as `format`: `photo.jpg` becomes
/// `photo_cleanup.jpg`, while `photo.bmp` written as PNG becomes `photo_cleanup.png`.
pub fn export_name(name: &str, format: ImageFormat) -> String {
    let (stem, extension) = match name.rfind('.') {
        Some(dot) if dot > 0 => (&name[..dot], Some(&name[dot + 1..])),
        _ => (name, None),
    };
    let extension = match extension {
        Some(ext) if ImageFormat::from_extension(ext) == Some(format) => ext,
        _ => format.extensions_str().first().copied().unwrap_or("png"),
    };
    format!("{stem}{EXPORT_SUFFIX}.{extension}")
}

/// Build the downloadable result.
///
/// In HD mode the latest render is composited onto the full-resolution original. In
/// standard mode the latest render itself is exported. With no render yet, HD exports
/// the original unchanged and standard mode exports the working image. The file is
/// written in the source's encoding format and named to match.
pub fn export(
    source: &SourceImage,
    history: &EditHistory,
    mode: ResolutionMode,
) -> EditorResult<ExportedImage> {
    let pixels = match (mode, history.latest_render()) {
        (ResolutionMode::Hd, Some(_)) => composite_history(source, history)?,
        (ResolutionMode::Standard, Some((_, render))) => render.pixels().clone(),
        (ResolutionMode::Hd, None) => source.original().clone(),
        (ResolutionMode::Standard, None) => source.working().clone(),
    };

    let (width, height) = source.working_dimensions();
    let mask_png = encode_mask_png(&rasterize(history, width, height))?;

    let format = codec::encoding_format(source.format());
    let bytes = codec::encode(&pixels, format)?;
    log::info!("Exported {}x{} {:?}", pixels.width(), pixels.height(), format);

    Ok(ExportedImage {
        name: export_name(source.name(), format),
        format,
        bytes,
        width: pixels.width(),
        height: pixels.height(),
        mask_png,
        pixels,
    })
}

/// Payload for the result store: input, mask and result, each capped at `max_size`
pub fn result_upload(
    source: &SourceImage,
    exported: &ExportedImage,
    max_size: u32,
) -> EditorResult<ResultUpload> {
    let format = exported.format;
    let capped = |image: &RgbaImage| -> EditorResult<Vec<u8>> {
        match codec::resize_to_max(image, max_size) {
            Some(resized) => codec::encode(&resized, format),
            None => codec::encode(image, format),
        }
    };

    let mask = image::load_from_memory(&exported.mask_png)?.to_luma8();
    let input_mask = if codec::needs_downscale(mask.width(), mask.height(), max_size) {
        let (w, h) = codec::fitted_dimensions(mask.width(), mask.height(), max_size);
        encode_mask_png(&imageops::resize(&mask, w, h, FilterType::Nearest))?
    } else {
        exported.mask_png.clone()
    };

    Ok(ResultUpload {
        input_image: capped(source.original())?,
        input_mime: format.to_mime_type(),
        input_mask,
        result_image: capped(exported.pixels())?,
        result_mime: format.to_mime_type(),
    })
}
