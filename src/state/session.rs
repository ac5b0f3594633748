//! The editing session: the one owner of the edit history and the render state.
//!
//! `EditorSession` is the primary interface for the editing core. It validates every
//! transition against the render state machine, keeps the history consistent with the
//! open image and the resolution mode, and emits an `EditorEvent` for everything the
//! product tracks.
//!
//! # Rendering
//!
//! A render is split in two so the UI can keep painting while the service works:
//! - `begin_render`: rasterize the mask, capture the history position, enter `Rendering`
//! - `finish_render`: apply the service's answer to the history and return to `Idle`
//!
//! `render` runs both around one awaited service call.
//!
//! # Example
//!
//! ```rust,no_run
//! use eframe_inpaint::state::{EditorSession, EditorSettings, StrokeOutcome};
//!
//! let mut session = EditorSession::new(EditorSettings::default());
//! session.open_image("photo.jpg", &std::fs::read("photo.jpg").unwrap()).unwrap();
//! session.begin_stroke(egui::pos2(10.0, 10.0), 1.0).unwrap();
//! session.append_point(egui::pos2(40.0, 12.0));
//! if session.end_stroke() == StrokeOutcome::RenderRequested {
//!     let job = session.begin_render().unwrap();
//!     // hand job.request() to the inpainting service, then:
//!     // session.finish_render(job, result)
//! }
//! ```
use std::time::Instant;

use egui::Pos2;
use image::RgbaImage;
use uuid::Uuid;

use super::{EditorSettings, RefinerType, RenderEvent, RenderState, ResolutionMode};
use crate::error::{EditorError, EditorResult};
use crate::event::{Alert, EditorEvent, EventBus};
use crate::export::{self, ExportedImage};
use crate::history::{EditHistory, HistoryMarker, UndoOutcome};
use crate::image::{RenderedImage, SourceImage};
use crate::raster::{mask, surface_pool};
use crate::renderer;
use crate::service::{InpaintError, InpaintRequest, InpaintService};

/// What the caller should do after a pointer-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeOutcome {
    /// No stroke was open
    Ignored,
    /// The stroke stays pending until a render is triggered
    Pending,
    /// Standard mode on a precise pointer: trigger a render now
    RenderRequested,
}

/// How a render ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Rendered { width: u32, height: u32 },
    Failed(Alert),
    /// The history was reset while the render was in flight; its result was dropped
    Discarded,
}

/// A render that has been started and awaits the service's answer
#[derive(Debug)]
pub struct RenderJob {
    request: InpaintRequest,
    marker: HistoryMarker,
    started_at: Instant,
    generation: u64,
}

impl RenderJob {
    pub fn request(&self) -> &InpaintRequest {
        &self.request
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }
}

#[derive(Debug)]
pub struct EditorSession {
    id: Uuid,
    settings: EditorSettings,
    image: Option<SourceImage>,
    history: EditHistory,
    render_state: RenderState,
    /// Bumped on every history reset; renders begun before a reset are discarded
    generation: u64,
    event_bus: EventBus,
}

impl EditorSession {
    pub fn new(settings: EditorSettings) -> Self {
        Self {
            id: Uuid::new_v4(),
            settings,
            image: None,
            history: EditHistory::new(),
            render_state: RenderState::Idle,
            generation: 0,
            event_bus: EventBus::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn mode(&self) -> ResolutionMode {
        self.settings.mode()
    }

    pub fn refiner(&self) -> RefinerType {
        self.settings.refiner
    }

    pub fn image(&self) -> Option<&SourceImage> {
        self.image.as_ref()
    }

    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    pub fn render_state(&self) -> &RenderState {
        &self.render_state
    }

    pub fn is_rendering(&self) -> bool {
        self.render_state.is_rendering()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Changes whenever the history is reset; lets views drop cached content
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Open an uploaded file, replacing any image and edits
    pub fn open_image(&mut self, name: &str, bytes: &[u8]) -> EditorResult<()> {
        let max_size = self.settings.max_working_size(self.mode());
        let image = SourceImage::decode(name, bytes, max_size)?;
        self.install_image(image);
        Ok(())
    }

    /// Open already decoded pixels, replacing any image and edits
    pub fn open_rgba(&mut self, name: &str, pixels: RgbaImage) -> EditorResult<()> {
        let max_size = self.settings.max_working_size(self.mode());
        let image = SourceImage::from_rgba(name, pixels, max_size)?;
        self.install_image(image);
        Ok(())
    }

    fn install_image(&mut self, image: SourceImage) {
        let (width, height) = image.original_dimensions();
        log::info!("Opened {} ({}x{})", image.name(), width, height);
        self.event_bus.emit(EditorEvent::ImageOpened {
            name: image.name().to_string(),
            width,
            height,
            downscaled: image.is_downscaled(),
        });
        self.image = Some(image);
        self.reset_history();
    }

    /// Start over: drop the image and every edit
    pub fn close_image(&mut self) {
        if self.image.take().is_some() {
            self.event_bus.emit(EditorEvent::ImageClosed);
        }
        self.reset_history();
        surface_pool::release();
    }

    /// Switch between standard and HD. Any change resets the history and re-derives the
    /// working image at the new size limit.
    pub fn set_mode(&mut self, mode: ResolutionMode) -> EditorResult<()> {
        let old = self.mode();
        if old == mode {
            return Ok(());
        }

        let image = match &self.image {
            Some(image) => Some(image.resized(self.settings.max_working_size(mode))?),
            None => None,
        };

        self.settings.use_hd = mode.is_hd();
        if image.is_some() {
            self.image = image;
        }
        self.event_bus.emit(EditorEvent::ModeChanged { old, new: mode });
        self.reset_history();
        Ok(())
    }

    /// Change the refiner quality. Returns true when the caller should re-render so the
    /// visible result reflects the new setting.
    pub fn set_refiner(&mut self, refiner: RefinerType) -> bool {
        if self.settings.refiner == refiner {
            return false;
        }
        self.settings.refiner = refiner;
        self.event_bus.emit(EditorEvent::RefinerChanged(refiner));
        self.image.is_some()
            && self.render_state.is_idle()
            && self.history.completed_stroke_count() > 0
    }

    /// Touch-style pointers never render on stroke completion and start with a larger brush
    pub fn set_coarse_pointer(&mut self, coarse: bool) {
        self.settings.set_coarse_pointer(coarse);
    }

    pub fn set_brush_size(&mut self, size: f32) {
        self.settings.set_brush_size(size);
    }

    /// Brush diameter in image pixels at the given viewport zoom, so the stroke looks
    /// the same size on screen whatever the zoom
    pub fn brush_width(&self, zoom: f32) -> f32 {
        if zoom.is_finite() && zoom > 0.0 {
            self.settings.brush_size / zoom
        } else {
            self.settings.brush_size
        }
    }

    /// Pointer-down at `point` (image space)
    pub fn begin_stroke(&mut self, point: Pos2, zoom: f32) -> EditorResult<()> {
        if self.image.is_none() {
            log::error!("Stroke started with no image open");
            return Err(EditorError::NoImage);
        }

        let width = self.brush_width(zoom);
        self.history
            .begin_stroke(width, self.mode(), self.render_state.is_rendering());
        self.history.append_point(point);
        self.event_bus.emit(EditorEvent::StrokeStarted { width });
        Ok(())
    }

    /// Pointer-move while dragging. No-op when no stroke is open.
    pub fn append_point(&mut self, point: Pos2) -> bool {
        self.history.append_point(point)
    }

    /// Pointer-up: close the stroke and decide whether it renders right away
    pub fn end_stroke(&mut self) -> StrokeOutcome {
        if !self.history.end_stroke() {
            return StrokeOutcome::Ignored;
        }

        let points = self
            .history
            .current_editable()
            .last_stroke()
            .map_or(0, |stroke| stroke.points().len());
        self.event_bus.emit(EditorEvent::StrokeCompleted { points });

        let auto_render = self.mode() == ResolutionMode::Standard
            && !self.settings.coarse_pointer
            && self.render_state.is_idle();
        if auto_render {
            StrokeOutcome::RenderRequested
        } else {
            self.history.push_empty_stroke();
            StrokeOutcome::Pending
        }
    }

    /// Whether the explicit render trigger should be enabled
    pub fn can_render(&self) -> bool {
        self.image.is_some()
            && self.render_state.is_idle()
            && self.history.current_editable().has_completed_stroke()
    }

    /// Enter `Rendering`: rasterize the mask of every stroke so far and build the request.
    ///
    /// Nothing changes when this fails.
    pub fn begin_render(&mut self) -> EditorResult<RenderJob> {
        let Some(image) = &self.image else {
            log::error!("Render triggered with no image open");
            return Err(EditorError::NoImage);
        };
        let now = Instant::now();
        let next = self
            .render_state
            .next(RenderEvent::Trigger { at: now })
            .inspect_err(|err| log::error!("Render not started: {err}"))?;
        if self.history.completed_stroke_count() == 0 {
            return Err(EditorError::NothingToRender);
        }

        let (width, height) = image.working_dimensions();
        let mask_png = surface_pool::with_mask_surface(width, height, |surface| {
            mask::rasterize_into(&self.history, surface);
            mask::encode_mask_png(surface)
        })??;

        let request = InpaintRequest {
            image: image.working_bytes_shared(),
            image_name: image.name().to_string(),
            image_mime: image.mime(),
            mask_png,
            mode: self.mode(),
            refiner: self.settings.refiner,
        };

        self.render_state = next;
        self.event_bus.emit(EditorEvent::RenderStarted {
            mode: request.mode,
            refiner: request.refiner,
        });
        Ok(RenderJob {
            request,
            marker: self.history.marker(),
            started_at: now,
            generation: self.generation,
        })
    }

    /// Apply the service's answer for `job` and return to `Idle`.
    ///
    /// Success appends a batch holding the decoded render. Failure leaves the renders
    /// untouched, gives the current batch a fresh empty stroke and reports the alert.
    pub fn finish_render(
        &mut self,
        job: RenderJob,
        result: Result<Vec<u8>, InpaintError>,
    ) -> EditorResult<RenderOutcome> {
        if job.generation != self.generation {
            log::info!("Dropping render begun before the history was reset");
            return Ok(RenderOutcome::Discarded);
        }

        let decoded = result.and_then(|bytes| {
            RenderedImage::decode(&bytes).map_err(|err| InpaintError::Decode(err.to_string()))
        });

        match decoded {
            Ok(render) => {
                self.render_state = self.render_state.next(RenderEvent::Succeeded)?;
                let (width, height) = render.dimensions();
                self.history.append_render(render.into(), job.marker);
                self.event_bus.emit(EditorEvent::RenderSucceeded {
                    duration_ms: job.started_at.elapsed().as_millis() as u64,
                    width,
                    height,
                });
                Ok(RenderOutcome::Rendered { width, height })
            }
            Err(err) => {
                let alert = err.alert();
                let failed = self.render_state.next(RenderEvent::Failed { alert })?;
                log::error!("Render failed: {err}");
                self.history.mark_render_failed();
                self.event_bus.emit(EditorEvent::RenderFailed {
                    alert,
                    status: err.status(),
                });
                self.render_state = failed.next(RenderEvent::Acknowledge)?;
                Ok(RenderOutcome::Failed(alert))
            }
        }
    }

    /// Begin a render, await `service`, and apply the answer
    pub async fn render(&mut self, service: &dyn InpaintService) -> EditorResult<RenderOutcome> {
        let job = self.begin_render()?;
        let result = service.inpaint(job.request.clone()).await;
        self.finish_render(job, result)
    }

    /// Whether the undo control should be enabled
    pub fn can_undo(&self) -> bool {
        self.image.is_some() && !self.render_state.is_rendering() && self.history.can_undo()
    }

    /// Undo the most recent unit of work; see `EditHistory::undo` for the granularity rules
    pub fn undo(&mut self, force_batch: bool) -> EditorResult<UndoOutcome> {
        if self.render_state.is_rendering() {
            return Err(EditorError::RenderInFlight);
        }
        if !self.history.can_undo() {
            return Ok(UndoOutcome::NothingToUndo);
        }

        let outcome = self.history.undo(self.mode(), force_batch);
        self.event_bus.emit(EditorEvent::Undo {
            batches: self.history.len(),
        });
        Ok(outcome)
    }

    /// Live preview at working resolution
    pub fn preview(&self) -> EditorResult<RgbaImage> {
        let image = self.image.as_ref().ok_or(EditorError::NoImage)?;
        renderer::preview(image, &self.history)
    }

    /// Build the downloadable result for the current state
    pub fn export(&self) -> EditorResult<ExportedImage> {
        let image = self.image.as_ref().ok_or(EditorError::NoImage)?;
        let exported = export::export(image, &self.history, self.mode())?;
        self.event_bus.emit(EditorEvent::Exported {
            name: exported.name.clone(),
            width: exported.width,
            height: exported.height,
        });
        Ok(exported)
    }

    fn reset_history(&mut self) {
        self.history.reset();
        self.render_state = RenderState::Idle;
        self.generation += 1;
        self.event_bus.emit(EditorEvent::HistoryReset);
    }
}
