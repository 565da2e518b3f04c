//! Task status and the actions that move a task between statuses.

use super::ParseTaskStatusError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Work is in progress.
    Active,
    /// A report was submitted and awaits the creator's decision.
    PendingReview,
    /// The task is done.
    Completed,
    /// The task was abandoned. Terminal.
    Cancelled,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::PendingReview => "pending_review",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns `true` while the task still expects work or a decision.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Active | Self::PendingReview)
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "active" => Ok(Self::Active),
            "pending_review" => Ok(Self::PendingReview),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle actions, used to report rejected transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskAction {
    /// Submit a report for review.
    Submit,
    /// Complete without review.
    Complete,
    /// Accept a submitted report.
    Confirm,
    /// Send a submitted report back for rework.
    Reject,
    /// Reopen a completed task.
    Reopen,
    /// Cancel the task.
    Cancel,
}

impl TaskAction {
    /// Returns a lowercase verb for messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Complete => "complete",
            Self::Confirm => "confirm",
            Self::Reject => "reject",
            Self::Reopen => "reopen",
            Self::Cancel => "cancel",
        }
    }
}

impl fmt::Display for TaskAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
