//! Capability checks layered on assignment resolution.

use super::resolver::has_access;
use crate::directory::domain::{User, UserId};
use crate::task::domain::{Task, TaskId};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Capability needed for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessRequirement {
    /// Only the creator may act.
    Creator,
    /// The creator or any responsible party may act.
    Participant,
}

/// Who may delete a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletePolicy {
    /// Only the creator.
    #[default]
    CreatorOnly,
    /// The creator or any responsible party.
    CreatorOrResponsible,
}

impl DeletePolicy {
    /// Access requirement enforced for deletion.
    #[must_use]
    pub const fn requirement(self) -> AccessRequirement {
        match self {
            Self::CreatorOnly => AccessRequirement::Creator,
            Self::CreatorOrResponsible => AccessRequirement::Participant,
        }
    }
}

/// Why access was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// The operation is reserved for the creator.
    NotCreator,
    /// The user neither created nor is responsible for the task.
    NotParticipant,
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotCreator => f.write_str("only the creator may do this"),
            Self::NotParticipant => f.write_str("not a participant of the task"),
        }
    }
}

/// Access refusal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("user {user} denied on task {task_id}: {reason}")]
pub struct AccessDenied {
    /// Refused user.
    pub user: UserId,
    /// Target task.
    pub task_id: TaskId,
    /// Refusal reason.
    pub reason: DenialReason,
}

/// Stateless authorisation checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessGuard;

impl AccessGuard {
    /// Authorises `user` on `task`. Administrators always pass.
    ///
    /// # Errors
    ///
    /// Returns [`AccessDenied`] when the requirement is not met.
    pub fn authorize(
        user: &User,
        task: &Task,
        requirement: AccessRequirement,
    ) -> Result<(), AccessDenied> {
        if user.is_admin() {
            return Ok(());
        }
        let reason = match requirement {
            AccessRequirement::Creator if task.creator() != user.id() => DenialReason::NotCreator,
            AccessRequirement::Participant if !has_access(task, user) => {
                DenialReason::NotParticipant
            }
            AccessRequirement::Creator | AccessRequirement::Participant => return Ok(()),
        };
        Err(AccessDenied {
            user: user.id().clone(),
            task_id: task.id(),
            reason,
        })
    }
}
