//! Subtasks and the derived progress counter.

use super::{SubtaskId, TaskDomainError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Checklist item belonging to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    id: SubtaskId,
    title: String,
    is_completed: bool,
    completed_at: Option<DateTime<Utc>>,
}

impl Subtask {
    /// Creates an open subtask.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptySubtaskTitle`] when the title is blank.
    pub fn new(id: SubtaskId, title: impl Into<String>) -> Result<Self, TaskDomainError> {
        Ok(Self {
            id,
            title: normalize_subtask_title(title)?,
            is_completed: false,
            completed_at: None,
        })
    }

    /// Reconstructs a subtask from storage.
    ///
    /// `completed_at` is dropped for open subtasks and defaulted to
    /// `fallback` for completed subtasks missing a timestamp, so the flag
    /// and the timestamp always agree.
    #[must_use]
    pub fn from_persisted(
        id: SubtaskId,
        title: String,
        is_completed: bool,
        completed_at: Option<DateTime<Utc>>,
        fallback: DateTime<Utc>,
    ) -> Self {
        let completed_at = if is_completed {
            Some(completed_at.unwrap_or(fallback))
        } else {
            None
        };
        Self {
            id,
            title,
            is_completed,
            completed_at,
        }
    }

    /// Returns the subtask identifier.
    #[must_use]
    pub const fn id(&self) -> SubtaskId {
        self.id
    }

    /// Returns the subtask title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns `true` once the subtask is done.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        self.is_completed
    }

    /// Returns when the subtask was completed.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Flips completion, keeping the timestamp in lockstep with the flag.
    pub(crate) const fn toggle(&mut self, now: DateTime<Utc>) -> bool {
        self.is_completed = !self.is_completed;
        self.completed_at = if self.is_completed { Some(now) } else { None };
        self.is_completed
    }
}

/// Validates and trims a subtask title.
///
/// # Errors
///
/// Returns [`TaskDomainError::EmptySubtaskTitle`] when the title is blank.
pub fn normalize_subtask_title(title: impl Into<String>) -> Result<String, TaskDomainError> {
    let raw = title.into();
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TaskDomainError::EmptySubtaskTitle);
    }
    Ok(trimmed.to_owned())
}

/// Completed-over-total subtask counter, rendered as `"c/t"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Progress {
    completed: usize,
    total: usize,
}

impl Progress {
    /// Computes progress over a subtask set.
    ///
    /// Returns `None` for an empty set.
    #[must_use]
    pub fn over(subtasks: &[Subtask]) -> Option<Self> {
        if subtasks.is_empty() {
            return None;
        }
        let completed = subtasks.iter().filter(|subtask| subtask.is_completed()).count();
        Some(Self {
            completed,
            total: subtasks.len(),
        })
    }

    /// Returns the number of completed subtasks.
    #[must_use]
    pub const fn completed(self) -> usize {
        self.completed
    }

    /// Returns the number of subtasks.
    #[must_use]
    pub const fn total(self) -> usize {
        self.total
    }

    /// Returns the number of open subtasks.
    #[must_use]
    pub const fn remaining(self) -> usize {
        self.total.saturating_sub(self.completed)
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.completed, self.total)
    }
}
