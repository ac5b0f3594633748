use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use crate::config::{ConfigError, ENV_ENDPOINT, ServiceConfig};
use crate::event::{Alert, AlertSink, LoggingHandler};
use crate::export;
use crate::file_handler::{FileHandler, ImageFile};
use crate::input::{InputHandler, Viewport, route_event};
use crate::panels::{central_panel, tools_panel};
use crate::renderer::Renderer;
use crate::service::{
    HttpInpaintService, InpaintError, InpaintService, ResultUploader, UnconfiguredService,
};
use crate::state::{
    EditorSession, EditorSettings, RefinerType, RenderJob, RenderOutcome, ResolutionMode,
    StrokeOutcome,
};

type RenderResult = Result<Vec<u8>, InpaintError>;

/// A render whose request is being served on a worker thread
struct PendingRender {
    job: RenderJob,
    receiver: Receiver<RenderResult>,
}

pub struct InpaintApp {
    session: EditorSession,
    renderer: Renderer,
    viewport: Viewport,
    /// Refit the viewport to the image on the next frame
    fit_pending: bool,
    input: InputHandler,
    file_handler: FileHandler,
    service: Arc<dyn InpaintService>,
    uploader: Option<ResultUploader>,
    pending: Option<PendingRender>,
    alerts: AlertSink,
    alert: Option<Alert>,
    source_path: Option<PathBuf>,
    status: Option<String>,
}

impl InpaintApp {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let settings = cc
            .storage
            .and_then(|storage| storage.get_string(eframe::APP_KEY))
            .and_then(|json| match EditorSettings::from_json(&json) {
                Ok(settings) => Some(settings),
                Err(err) => {
                    log::warn!("Ignoring saved settings: {err}");
                    None
                }
            })
            .unwrap_or_default();

        let (service, uploader) = connect_service();
        Self::with_service(cc.egui_ctx.clone(), settings, service, uploader)
    }

    pub fn with_service(
        ctx: egui::Context,
        settings: EditorSettings,
        service: Arc<dyn InpaintService>,
        uploader: Option<ResultUploader>,
    ) -> Self {
        let session = EditorSession::new(settings);
        let alerts = AlertSink::new();
        session.event_bus().subscribe(Box::new(LoggingHandler));
        session.event_bus().subscribe(Box::new(alerts.clone()));

        Self {
            session,
            renderer: Renderer::new(ctx),
            viewport: Viewport::default(),
            fit_pending: false,
            input: InputHandler::new(),
            file_handler: FileHandler::new(),
            service,
            uploader,
            pending: None,
            alerts,
            alert: None,
            source_path: None,
            status: None,
        }
    }

    pub fn session(&self) -> &EditorSession {
        &self.session
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn open_file(&mut self, file: ImageFile) {
        match self.session.open_image(&file.name, &file.bytes) {
            Ok(()) => {
                self.source_path = file.path;
                self.fit_pending = true;
                self.status = None;
                self.renderer.invalidate();
            }
            Err(err) => {
                log::error!("Could not open {}: {err}", file.name);
                self.status = Some(format!("Could not open {}", file.name));
            }
        }
    }

    pub fn close_image(&mut self) {
        self.session.close_image();
        self.source_path = None;
        self.status = None;
        self.renderer.invalidate();
    }

    pub fn set_mode(&mut self, mode: ResolutionMode) {
        if let Err(err) = self.session.set_mode(mode) {
            log::error!("Could not switch to {}: {err}", mode.label());
        }
        self.fit_pending = true;
    }

    pub fn set_refiner(&mut self, refiner: RefinerType, ctx: &egui::Context) {
        if self.session.set_refiner(refiner) {
            self.start_render(ctx);
        }
    }

    pub fn set_brush_size(&mut self, size: f32) {
        self.session.set_brush_size(size);
    }

    pub fn undo(&mut self, force_batch: bool) {
        if let Err(err) = self.session.undo(force_batch) {
            log::warn!("Undo refused: {err}");
        }
    }

    /// Trigger a render and serve its request on a worker thread
    pub fn start_render(&mut self, ctx: &egui::Context) {
        let job = match self.session.begin_render() {
            Ok(job) => job,
            Err(err) => {
                log::warn!("Render not started: {err}");
                return;
            }
        };

        let (sender, receiver) = mpsc::channel();
        let request = job.request().clone();
        let service = Arc::clone(&self.service);
        let ctx = ctx.clone();
        let spawned = thread::Builder::new()
            .name("render-worker".into())
            .spawn(move || {
                let result = futures::executor::block_on(service.inpaint(request));
                let _ = sender.send(result);
                ctx.request_repaint();
            });

        if let Err(err) = spawned {
            self.apply_render_result(job, Err(InpaintError::Transport(err.to_string())));
            return;
        }
        self.pending = Some(PendingRender { job, receiver });
    }

    fn poll_render(&mut self) {
        let Some(pending) = &self.pending else {
            return;
        };
        let result = match pending.receiver.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => {
                Err(InpaintError::Transport("render worker stopped".into()))
            }
        };
        if let Some(pending) = self.pending.take() {
            self.apply_render_result(pending.job, result);
        }
    }

    fn apply_render_result(&mut self, job: RenderJob, result: RenderResult) {
        match self.session.finish_render(job, result) {
            Ok(RenderOutcome::Rendered { .. }) => self.status = None,
            Ok(RenderOutcome::Failed(alert)) => log::debug!("Render failed: {alert:?}"),
            Ok(RenderOutcome::Discarded) => {}
            Err(err) => log::error!("Render result not applied: {err}"),
        }
    }

    /// Write the result next to the source (or into the working directory) and start
    /// the background upload
    pub fn export(&mut self) {
        let exported = match self.session.export() {
            Ok(exported) => exported,
            Err(err) => {
                log::error!("Export failed: {err}");
                self.status = Some("Export failed".into());
                return;
            }
        };

        let dir = self
            .source_path
            .as_deref()
            .and_then(|path| path.parent())
            .map(PathBuf::from)
            .unwrap_or_default();
        let target = dir.join(&exported.name);
        let written = std::fs::write(&target, &exported.bytes)
            .and_then(|()| std::fs::write(dir.join("mask.png"), &exported.mask_png));
        self.status = Some(match written {
            Ok(()) => format!("Saved {}", target.display()),
            Err(err) => {
                log::error!("Could not write {}: {err}", target.display());
                format!("Could not write {}", target.display())
            }
        });

        if let (Some(uploader), Some(source)) = (&self.uploader, self.session.image()) {
            let max_size = self.session.settings().upload_max_size;
            match export::result_upload(source, &exported, max_size) {
                Ok(upload) => uploader.spawn(upload),
                Err(err) => log::warn!("Result upload skipped: {err}"),
            }
        }
    }

    pub fn alert(&self) -> Option<Alert> {
        self.alert
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    /// Feed this frame's canvas input into the session
    pub fn handle_canvas_input(&mut self, ctx: &egui::Context, canvas: egui::Rect) {
        if let Some(source) = self.session.image() {
            if self.fit_pending {
                let (width, height) = source.working_dimensions();
                self.viewport = Viewport::fit(canvas, width as f32, height as f32);
                self.fit_pending = false;
            }
        }

        let events = self.input.process_input(ctx, canvas);
        if self.input.touch_seen() && !self.session.settings().coarse_pointer {
            log::info!("Touch input detected, deferring renders to the explicit trigger");
            self.session.set_coarse_pointer(true);
        }

        for event in &events {
            match route_event(event, &mut self.session, &mut self.viewport, canvas) {
                Ok(Some(StrokeOutcome::RenderRequested)) => self.start_render(ctx),
                Ok(_) => {}
                Err(err) => log::warn!("Input ignored: {err}"),
            }
        }
    }

    pub fn paint_canvas(&mut self, painter: &egui::Painter, canvas: egui::Rect) {
        self.renderer.render(painter, canvas, &self.session, &self.viewport);
    }
}

/// The HTTP service when the environment configures one, otherwise a stand-in whose
/// renders fail with the configuration error
fn connect_service() -> (Arc<dyn InpaintService>, Option<ResultUploader>) {
    let config = match ServiceConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            log::warn!("Rendering disabled: {err}");
            let service: Arc<dyn InpaintService> = Arc::new(UnconfiguredService::new(err));
            return (service, None);
        }
    };

    let uploader = ResultUploader::new(&config);
    let service: Arc<dyn InpaintService> = match HttpInpaintService::new(config) {
        Ok(service) => Arc::new(service),
        Err(err) => {
            log::error!("Inpainting client unavailable: {err}");
            let reason = ConfigError::Invalid {
                name: ENV_ENDPOINT,
                reason: err.to_string(),
            };
            return (Arc::new(UnconfiguredService::new(reason)), None);
        }
    };
    (service, uploader)
}

impl eframe::App for InpaintApp {
    /// Called by the frame work to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        match self.session.settings().to_json() {
            Ok(json) => storage.set_string(eframe::APP_KEY, json),
            Err(err) => log::error!("Could not save settings: {err}"),
        }
    }

    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_render();
        if let Some(alert) = self.alerts.take() {
            self.alert = Some(alert);
        }

        if self.file_handler.check_for_dropped_files(ctx) {
            if let Some(file) = self.file_handler.take_image() {
                self.open_file(file);
            }
        }

        let undo_requested = ctx.input_mut(|i| {
            i.consume_key(egui::Modifiers::COMMAND, egui::Key::Z)
        });
        if undo_requested && self.session.can_undo() {
            self.undo(false);
        }

        tools_panel(self, ctx);
        central_panel(self, ctx);

        if let Some(alert) = self.alert {
            egui::Window::new("Render failed")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
                .show(ctx, |ui| {
                    ui.label(alert.message());
                    if ui.button("OK").clicked() {
                        self.dismiss_alert();
                    }
                });
        }

        if self.session.is_rendering() {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}
