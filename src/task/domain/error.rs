//! Error types for task domain validation and parsing.

use super::{SubtaskId, TaskAction, TaskStatus};
use thiserror::Error;

/// Typed reasons for rejecting a task mutation.
///
/// Every variant is raised before any write is committed, so callers can
/// render a specific message without inspecting free text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// An identifier is not a positive integer.
    #[error("invalid {kind} identifier {value}, expected a positive integer")]
    InvalidId {
        /// Identifier kind, for example `task`.
        kind: &'static str,
        /// Rejected value.
        value: i64,
    },

    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// A subtask title is empty after trimming.
    #[error("subtask title must not be empty")]
    EmptySubtaskTitle,

    /// A comment body is empty after trimming.
    #[error("comment must not be empty")]
    EmptyComment,

    /// Both a user assignee and a role were supplied.
    #[error("a task is assigned to either a user or a role, not both")]
    AssignmentConflict,

    /// Neither a user assignee nor a role was supplied.
    #[error("a task must be assigned to a user or a role")]
    AssignmentMissing,

    /// The reminder interval is zero.
    #[error("invalid notification interval {0}, expected a positive number of minutes")]
    InvalidInterval(u32),

    /// The requested transition is not valid from the current status.
    #[error("cannot {action} a task that is {from}")]
    InvalidTransition {
        /// Status at the time of the request.
        from: TaskStatus,
        /// Requested action.
        action: TaskAction,
    },

    /// Some subtasks are still open.
    #[error("{remaining} subtask(s) still incomplete")]
    SubtasksIncomplete {
        /// Number of incomplete subtasks.
        remaining: usize,
    },

    /// A review submission carried neither text nor attachments.
    #[error("a report needs text or at least one attachment")]
    ReportMissing,

    /// A text-only report is shorter than the minimum.
    #[error("report text must be at least {min} characters")]
    ReportTooShort {
        /// Minimum number of characters.
        min: usize,
    },

    /// Direct completion was requested but the creator is not the sole
    /// assignee.
    #[error("only a task assigned solely to its creator can be completed directly")]
    NotSoleAssignee,

    /// The creator asked for review of a task they decide on.
    #[error("the creator reviews reports and cannot submit one")]
    CreatorCannotSubmit,

    /// The task is closed and cannot be edited.
    #[error("task is {0} and cannot be edited")]
    Closed(TaskStatus),

    /// The referenced subtask does not belong to the task.
    #[error("subtask not found: {0}")]
    SubtaskNotFound(SubtaskId),
}

/// Error returned while parsing task statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

/// Error returned while parsing history actions from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown history action: {0}")]
pub struct ParseHistoryActionError(pub String);

/// Error returned while parsing attachment kinds.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown attachment kind: {0}")]
pub struct ParseBlobKindError(pub String);
