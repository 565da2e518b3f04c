//! Session domain model.

mod error;
mod payload;
mod session;
mod step;

pub use error::SessionDomainError;
pub use payload::{
    CalendarCursor, CalendarReturn, CreationDraft, EditField, EditSession, SessionPayload,
};
pub use session::Session;
pub use step::{Flow, WizardStep};
