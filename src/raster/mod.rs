//! Pixel work on in-memory buffers: the stroke mask and the final composite.

pub mod composite;
pub mod mask;
pub mod surface_pool;

pub use composite::{composite, composite_history};
pub use mask::{BRUSH_COLOR, BRUSH_RGBA, encode_mask_png, rasterize, rasterize_into};
