//! Repository port for task persistence and lookup.

use crate::directory::domain::{RoleId, UserId};
use crate::task::domain::{
    HistoryRecord, NewComment, NewTask, Task, TaskComment, TaskDomainError, TaskHistoryEntry,
    TaskId, TaskStatus,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Read-check-write mutation applied to a locked task.
///
/// The closure validates and mutates the aggregate, returning the history
/// records that must be committed with it. Returning an error aborts the
/// write and leaves storage untouched.
pub type TaskMutation =
    Box<dyn FnOnce(&mut Task) -> Result<Vec<HistoryRecord>, TaskDomainError> + Send>;

/// Task persistence contract.
///
/// Every method is atomic: either all rows it touches are written or none
/// are.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task with its subtasks and creation history entry.
    async fn create(&self, task: NewTask) -> TaskRepositoryResult<Task>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Applies `mutation` to the current task state under a row lock.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task is missing and
    /// [`TaskRepositoryError::Rejected`] when the mutation refuses the change.
    async fn modify(&self, id: TaskId, mutation: TaskMutation) -> TaskRepositoryResult<Task>;

    /// Creates subtasks for an existing task and recomputes its progress.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task is missing and
    /// [`TaskRepositoryError::Rejected`] when the task is closed or a title
    /// is blank.
    async fn add_subtasks(
        &self,
        id: TaskId,
        titles: Vec<String>,
        actor: UserId,
        now: DateTime<Utc>,
    ) -> TaskRepositoryResult<Task>;

    /// Deletes a task with its subtasks, comments, and history.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task is missing.
    async fn delete(&self, id: TaskId) -> TaskRepositoryResult<()>;

    /// Stores a comment and its history entry.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task is missing.
    async fn append_comment(&self, comment: NewComment) -> TaskRepositoryResult<TaskComment>;

    /// Lists comments of a task in creation order.
    async fn comments(&self, id: TaskId) -> TaskRepositoryResult<Vec<TaskComment>>;

    /// Lists history entries of a task in creation order.
    async fn history(&self, id: TaskId) -> TaskRepositoryResult<Vec<TaskHistoryEntry>>;

    /// Lists tasks in `statuses` for which `user` is responsible, either
    /// directly or through one of `roles`.
    async fn list_responsible(
        &self,
        user: &UserId,
        roles: &BTreeSet<RoleId>,
        statuses: &[TaskStatus],
    ) -> TaskRepositoryResult<Vec<Task>>;

    /// Lists tasks created by `user`, newest first.
    async fn list_created_by(&self, user: &UserId) -> TaskRepositoryResult<Vec<Task>>;

    /// Lists open tasks that have a reminder interval.
    async fn list_with_interval(&self) -> TaskRepositoryResult<Vec<Task>>;

    /// Lists active tasks due in `[start, end)`.
    async fn list_active_due_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> TaskRepositoryResult<Vec<Task>>;

    /// Lists active tasks that have a due date.
    async fn list_active_with_due_date(&self) -> TaskRepositoryResult<Vec<Task>>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The domain refused the requested mutation.
    #[error(transparent)]
    Rejected(TaskDomainError),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

/// Orders tasks for listings: nearest due date first, undated last, then id.
pub(crate) fn sort_for_listing(tasks: &mut [Task]) {
    tasks.sort_by(|left, right| match (left.due_date(), right.due_date()) {
        (Some(a), Some(b)) => a.cmp(&b).then_with(|| left.id().cmp(&right.id())),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => left.id().cmp(&right.id()),
    });
}

/// Returns `true` when `user` is responsible for `task` directly or via
/// `roles`.
pub(crate) fn is_responsible(task: &Task, user: &UserId, roles: &BTreeSet<RoleId>) -> bool {
    task.assignment().is_user(user)
        || task
            .assignment()
            .role()
            .is_some_and(|role| roles.contains(&role))
}
