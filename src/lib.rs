#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod config;
pub mod error;
pub mod event;
pub mod export;
pub mod file_handler;
pub mod history;
pub mod image;
pub mod input;
pub mod panels;
pub mod raster;
pub mod renderer;
pub mod service;
pub mod state;
pub mod stroke;
mod geometry;

pub use app::InpaintApp;
pub use error::{EditorError, EditorResult};
pub use history::{EditBatch, EditHistory, HistoryMarker, UndoOutcome};
pub use renderer::Renderer;
pub use state::{EditorSession, EditorSettings, RefinerType, RenderState, ResolutionMode};
pub use stroke::Stroke;
