use std::sync::Arc;

use parking_lot::Mutex;

use crate::event::{Alert, EditorEvent, EventHandler};

/// Writes every event through the `log` facade; tracked analytics events go out at `info`
#[derive(Debug, Default)]
pub struct LoggingHandler;

impl EventHandler for LoggingHandler {
    fn handle_event(&mut self, event: &EditorEvent) {
        match (event.analytics_name(), event) {
            (Some(name), EditorEvent::RenderFailed { alert, status }) => {
                log::warn!("{name}: {alert} (status {status:?})");
            }
            (Some(name), event) => log::info!("{name}: {event:?}"),
            (None, event) => log::debug!("{event:?}"),
        }
    }
}

/// Keeps the most recent render alert until the UI shows and takes it
#[derive(Debug, Clone, Default)]
pub struct AlertSink {
    latest: Arc<Mutex<Option<Alert>>>,
}

impl AlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Option<Alert> {
        self.latest.lock().take()
    }
}

impl EventHandler for AlertSink {
    fn handle_event(&mut self, event: &EditorEvent) {
        if let EditorEvent::RenderFailed { alert, .. } = event {
            *self.latest.lock() = Some(*alert);
        }
    }
}

/// Records every event it sees; clones share the same log
#[derive(Debug, Clone, Default)]
pub struct RecordingHandler {
    events: Arc<Mutex<Vec<EditorEvent>>>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<EditorEvent> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventHandler for RecordingHandler {
    fn handle_event(&mut self, event: &EditorEvent) {
        self.events.lock().push(event.clone());
    }
}
