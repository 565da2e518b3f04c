//! Identifier types for the task domain.
//!
//! All identifiers are positive 64-bit integers assigned by the repository.

use super::TaskDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! positive_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Creates a validated identifier.
            ///
            /// # Errors
            ///
            /// Returns [`TaskDomainError::InvalidId`] when the value is not
            /// positive.
            pub const fn new(value: i64) -> Result<Self, TaskDomainError> {
                if value <= 0 {
                    return Err(TaskDomainError::InvalidId { kind: $kind, value });
                }
                Ok(Self(value))
            }

            /// Returns the underlying numeric value.
            #[must_use]
            pub const fn value(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

positive_id!(
    /// Identifier of a task.
    TaskId,
    "task"
);
positive_id!(
    /// Identifier of a subtask.
    SubtaskId,
    "subtask"
);
positive_id!(
    /// Identifier of a task comment.
    CommentId,
    "comment"
);
positive_id!(
    /// Identifier of a history entry.
    HistoryId,
    "history entry"
);

/// Reminder cadence for a task, in whole minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationInterval(u32);

impl NotificationInterval {
    /// Creates a validated interval.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidInterval`] for zero minutes.
    pub const fn from_minutes(minutes: u32) -> Result<Self, TaskDomainError> {
        if minutes == 0 {
            return Err(TaskDomainError::InvalidInterval(minutes));
        }
        Ok(Self(minutes))
    }

    /// Returns the interval length in minutes.
    #[must_use]
    pub const fn minutes(self) -> u32 {
        self.0
    }

    /// Returns the interval as a `chrono` duration.
    #[must_use]
    pub fn as_duration(self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.0))
    }
}

impl fmt::Display for NotificationInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} min", self.0)
    }
}
