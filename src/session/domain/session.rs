//! Session aggregate.

use super::{SessionDomainError, SessionPayload, WizardStep};
use crate::directory::domain::UserId;
use chrono::{DateTime, Utc};

/// Persisted conversation state of one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user_id: UserId,
    step: WizardStep,
    payload: SessionPayload,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn check(step: WizardStep, payload: &SessionPayload) -> Result<(), SessionDomainError> {
    if !step.flows().contains(&payload.flow()) {
        return Err(SessionDomainError::StepPayloadMismatch {
            step,
            payload: payload.flow(),
        });
    }
    if step.is_calendar() && payload.calendar().is_none() {
        return Err(SessionDomainError::CalendarMissing(step));
    }
    Ok(())
}

impl Session {
    /// Starts a wizard for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionDomainError`] when `payload` does not fit `step`.
    pub fn start(
        user_id: UserId,
        step: WizardStep,
        payload: SessionPayload,
        now: DateTime<Utc>,
    ) -> Result<Self, SessionDomainError> {
        check(step, &payload)?;
        Ok(Self {
            user_id,
            step,
            payload,
            created_at: now,
            updated_at: now,
        })
    }

    /// Reconstructs a session from storage.
    ///
    /// # Errors
    ///
    /// Returns [`SessionDomainError`] when the stored tag and payload
    /// disagree.
    pub fn from_persisted(
        user_id: UserId,
        step: WizardStep,
        payload: SessionPayload,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, SessionDomainError> {
        check(step, &payload)?;
        Ok(Self {
            user_id,
            step,
            payload,
            created_at,
            updated_at,
        })
    }

    /// Moves to `step` with `payload`, keeping the start time.
    ///
    /// The payload is replaced wholesale; carry forward whatever the next
    /// step still needs.
    ///
    /// # Errors
    ///
    /// Returns [`SessionDomainError`] when `payload` does not fit `step`.
    pub fn advance(
        self,
        step: WizardStep,
        payload: SessionPayload,
        now: DateTime<Utc>,
    ) -> Result<Self, SessionDomainError> {
        check(step, &payload)?;
        Ok(Self {
            user_id: self.user_id,
            step,
            payload,
            created_at: self.created_at,
            updated_at: now,
        })
    }

    /// Returns the owning user.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Returns the state tag.
    #[must_use]
    pub const fn step(&self) -> WizardStep {
        self.step
    }

    /// Returns the payload.
    #[must_use]
    pub const fn payload(&self) -> &SessionPayload {
        &self.payload
    }

    /// Returns when the wizard started.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the session was last written.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
