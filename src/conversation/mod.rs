//! Conversation engine: turns inbound chat events into replies.
//!
//! The engine is transport-agnostic. A transport adapter converts its
//! updates into [`InboundEvent`]s, calls [`ConversationEngine::handle`], and
//! renders the returned [`OutboundMessage`](crate::notification::domain::OutboundMessage)s.
//! Buttons carry [`Command`] strings so a stale button can always be
//! decoded and refused cleanly.
//!
//! Multi-step flows (registration, task creation, editing, reports,
//! comments, profile edits) keep their state in the
//! [`SessionStore`](crate::session::ports::SessionStore), so a restart
//! resumes at the same step.

mod actions;
pub mod calendar;
pub mod command;
mod creation;
mod editing;
pub mod engine;
pub mod error;
pub mod event;
mod pickers;
mod profile;
pub mod settings;
pub mod views;

pub use command::{Command, CommandError, ProfileField};
pub use engine::{ConversationEngine, Replies};
pub use error::{EngineError, EngineResult, InputError};
pub use event::InboundEvent;
pub use settings::ConversationSettings;
