mod bus;
mod events;
mod handlers;

pub use bus::EventBus;
pub use events::{Alert, EditorEvent};
pub use handlers::{AlertSink, LoggingHandler, RecordingHandler};

pub trait EventHandler: Send {
    fn handle_event(&mut self, event: &EditorEvent);
}
