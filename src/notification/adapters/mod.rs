//! Notifier adapters.

mod log;
mod recording;

pub use log::TracingNotifier;
pub use recording::{RecordingNotifier, SentMessage};
