//! Session validation errors.

use super::{Flow, WizardStep};
use thiserror::Error;

/// Errors raised while building or decoding a session.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionDomainError {
    /// The stored state tag is not a known step.
    #[error("unknown wizard step: {0}")]
    UnknownStep(String),

    /// The payload belongs to a different flow than the step.
    #[error("step {step} cannot carry a {payload} payload")]
    StepPayloadMismatch {
        /// Requested step.
        step: WizardStep,
        /// Flow of the supplied payload.
        payload: Flow,
    },

    /// A calendar step was requested without a calendar cursor.
    #[error("step {0} requires an open calendar")]
    CalendarMissing(WizardStep),
}
