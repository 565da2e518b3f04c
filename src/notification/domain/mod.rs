//! Transport-neutral message shapes.

mod message;

pub use message::{Button, MessageKind, OutboundMessage};
