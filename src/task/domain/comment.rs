//! Append-only discussion and audit records attached to a task.

use super::{CommentId, HistoryId, ParseHistoryActionError, TaskDomainError, TaskId};
use crate::directory::domain::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Comment left on a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskComment {
    /// Comment identifier.
    pub id: CommentId,
    /// Task the comment belongs to.
    pub task_id: TaskId,
    /// Comment author.
    pub author: UserId,
    /// Comment body.
    pub text: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Validated comment awaiting persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    task_id: TaskId,
    author: UserId,
    text: String,
    created_at: DateTime<Utc>,
}

impl NewComment {
    /// Validates a comment body.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyComment`] when the body is blank.
    pub fn new(
        task_id: TaskId,
        author: UserId,
        text: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, TaskDomainError> {
        let raw = text.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyComment);
        }
        Ok(Self {
            task_id,
            author,
            text: trimmed.to_owned(),
            created_at,
        })
    }

    /// Returns the target task.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the author.
    #[must_use]
    pub const fn author(&self) -> &UserId {
        &self.author
    }

    /// Returns the comment body.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Attaches the identifier assigned by storage.
    #[must_use]
    pub fn into_comment(self, id: CommentId) -> TaskComment {
        TaskComment {
            id,
            task_id: self.task_id,
            author: self.author,
            text: self.text,
            created_at: self.created_at,
        }
    }
}

/// Kind of change recorded in task history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    /// The task was created.
    Created,
    /// The status changed.
    StatusChanged,
    /// The title changed.
    TitleChanged,
    /// The description changed.
    DescriptionChanged,
    /// The due date changed.
    DueDateChanged,
    /// The reminder interval changed.
    IntervalChanged,
    /// The assignee or role changed.
    AssignmentChanged,
    /// A subtask was completed or reopened.
    SubtaskToggled,
    /// Subtasks were added after creation.
    SubtasksAdded,
    /// A comment was posted.
    CommentAdded,
}

impl HistoryAction {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::StatusChanged => "status_changed",
            Self::TitleChanged => "title_changed",
            Self::DescriptionChanged => "description_changed",
            Self::DueDateChanged => "due_date_changed",
            Self::IntervalChanged => "interval_changed",
            Self::AssignmentChanged => "assignment_changed",
            Self::SubtaskToggled => "subtask_toggled",
            Self::SubtasksAdded => "subtasks_added",
            Self::CommentAdded => "comment_added",
        }
    }
}

impl TryFrom<&str> for HistoryAction {
    type Error = ParseHistoryActionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim() {
            "created" => Ok(Self::Created),
            "status_changed" => Ok(Self::StatusChanged),
            "title_changed" => Ok(Self::TitleChanged),
            "description_changed" => Ok(Self::DescriptionChanged),
            "due_date_changed" => Ok(Self::DueDateChanged),
            "interval_changed" => Ok(Self::IntervalChanged),
            "assignment_changed" => Ok(Self::AssignmentChanged),
            "subtask_toggled" => Ok(Self::SubtaskToggled),
            "subtasks_added" => Ok(Self::SubtasksAdded),
            "comment_added" => Ok(Self::CommentAdded),
            _ => Err(ParseHistoryActionError(value.to_owned())),
        }
    }
}

/// Persisted audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskHistoryEntry {
    /// Entry identifier.
    pub id: HistoryId,
    /// Task the entry belongs to.
    pub task_id: TaskId,
    /// User who made the change.
    pub actor: UserId,
    /// Kind of change.
    pub action: HistoryAction,
    /// Value before the change.
    pub old_value: Option<String>,
    /// Value after the change.
    pub new_value: Option<String>,
    /// When the change was committed.
    pub created_at: DateTime<Utc>,
}

/// Audit record produced by a domain mutation, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    /// User who made the change.
    pub actor: UserId,
    /// Kind of change.
    pub action: HistoryAction,
    /// Value before the change.
    pub old_value: Option<String>,
    /// Value after the change.
    pub new_value: Option<String>,
    /// When the change happened.
    pub created_at: DateTime<Utc>,
}

impl HistoryRecord {
    /// Creates a record describing a change from `old_value` to `new_value`.
    #[must_use]
    pub const fn new(
        actor: UserId,
        action: HistoryAction,
        old_value: Option<String>,
        new_value: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            actor,
            action,
            old_value,
            new_value,
            created_at,
        }
    }

    /// Attaches storage identifiers.
    #[must_use]
    pub fn into_entry(self, id: HistoryId, task_id: TaskId) -> TaskHistoryEntry {
        TaskHistoryEntry {
            id,
            task_id,
            actor: self.actor,
            action: self.action,
            old_value: self.old_value,
            new_value: self.new_value,
            created_at: self.created_at,
        }
    }
}
