//! Rendering and fan-out services.

mod dispatch;
mod renderer;

pub use dispatch::{DeliveryReport, dispatch};
pub use renderer::{MessageRenderer, RenderError, Template};
