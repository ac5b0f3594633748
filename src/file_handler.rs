use std::path::{Path, PathBuf};
use std::sync::Arc;

use eframe::egui;

/// An image file the user dropped on the window, read into memory
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub name: String,
    /// Where it came from, when the platform tells us
    pub path: Option<PathBuf>,
    pub bytes: Arc<[u8]>,
}

/// Collects dropped files and hands over the image ones
#[derive(Debug, Default)]
pub struct FileHandler {
    dropped_files: Vec<egui::DroppedFile>,
}

impl FileHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick up newly dropped files from the UI context.
    /// Returns true if any were dropped this frame.
    pub fn check_for_dropped_files(&mut self, ctx: &egui::Context) -> bool {
        let mut new_dropped_files = false;

        ctx.input(|i| {
            if !i.raw.dropped_files.is_empty() {
                self.dropped_files = i.raw.dropped_files.clone();
                new_dropped_files = true;
            }
        });

        new_dropped_files
    }

    /// The last dropped image, if any. Only one image is edited at a time.
    pub fn take_image(&mut self) -> Option<ImageFile> {
        let files = std::mem::take(&mut self.dropped_files);
        files.iter().rev().find_map(|file| {
            let name = display_name(file);
            if !is_image_file(file) {
                log::warn!("Dropped file is not a supported type: {}", name);
                return None;
            }
            read_bytes(file).map(|bytes| ImageFile {
                name,
                path: file.path.clone(),
                bytes,
            })
        })
    }
}

fn display_name(file: &egui::DroppedFile) -> String {
    if let Some(name) = file.path.as_deref().and_then(Path::file_name) {
        name.to_string_lossy().into_owned()
    } else if !file.name.is_empty() {
        file.name.clone()
    } else {
        "image.png".to_owned()
    }
}

/// Check if a file is an image based on MIME type or extension
fn is_image_file(file: &egui::DroppedFile) -> bool {
    if !file.mime.is_empty() {
        return file.mime.starts_with("image/");
    }
    let name = file
        .path
        .as_deref()
        .map(|path| path.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.name.clone());
    has_image_extension(&name)
}

pub fn has_image_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "gif" | "webp" | "bmp"))
}

fn read_bytes(file: &egui::DroppedFile) -> Option<Arc<[u8]>> {
    if let Some(bytes) = &file.bytes {
        return Some(bytes.clone());
    }
    let path = file.path.as_ref()?;
    match std::fs::read(path) {
        Ok(bytes) => Some(bytes.into()),
        Err(err) => {
            log::error!("Failed to read image file: {}: {}", path.display(), err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_extensions() {
        assert!(has_image_extension("a/b/photo.JPG"));
        assert!(has_image_extension("x.webp"));
        assert!(!has_image_extension("notes.txt"));
        assert!(!has_image_extension("png"));
    }

    #[test]
    fn test_take_image_prefers_last_dropped_image() {
        let mut handler = FileHandler::new();
        handler.dropped_files = vec![
            egui::DroppedFile {
                name: "first.png".into(),
                bytes: Some(Arc::from(vec![1u8])),
                ..Default::default()
            },
            egui::DroppedFile {
                name: "notes.txt".into(),
                bytes: Some(Arc::from(vec![2u8])),
                ..Default::default()
            },
        ];

        let image = handler.take_image().unwrap();
        assert_eq!(image.name, "first.png");
        assert_eq!(&*image.bytes, &[1u8]);
        assert!(handler.take_image().is_none());
    }
}
