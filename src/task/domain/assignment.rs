//! Exclusive task ownership: one user or one role-group.

use super::TaskDomainError;
use crate::directory::domain::{RoleId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who is responsible for a task.
///
/// Storage keeps two nullable columns; [`Assignment::from_columns`] is the
/// only way back from that shape, so a task with both or neither set cannot
/// be constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Assignment {
    /// A single user is responsible.
    User(UserId),
    /// Every member of the role is responsible.
    Role(RoleId),
}

impl Assignment {
    /// Builds an assignment from nullable storage columns.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::AssignmentConflict`] when both are set and
    /// [`TaskDomainError::AssignmentMissing`] when neither is.
    pub fn from_columns(
        assignee: Option<UserId>,
        role: Option<RoleId>,
    ) -> Result<Self, TaskDomainError> {
        match (assignee, role) {
            (Some(user), None) => Ok(Self::User(user)),
            (None, Some(role_id)) => Ok(Self::Role(role_id)),
            (Some(_), Some(_)) => Err(TaskDomainError::AssignmentConflict),
            (None, None) => Err(TaskDomainError::AssignmentMissing),
        }
    }

    /// Returns the direct assignee, if any.
    #[must_use]
    pub const fn assignee(&self) -> Option<&UserId> {
        match self {
            Self::User(user) => Some(user),
            Self::Role(_) => None,
        }
    }

    /// Returns the assigned role, if any.
    #[must_use]
    pub const fn role(&self) -> Option<RoleId> {
        match self {
            Self::User(_) => None,
            Self::Role(role) => Some(*role),
        }
    }

    /// Returns `true` when `user` is the direct assignee.
    #[must_use]
    pub fn is_user(&self, user: &UserId) -> bool {
        self.assignee() == Some(user)
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(user) => write!(f, "user:{user}"),
            Self::Role(role) => write!(f, "role:{role}"),
        }
    }
}
