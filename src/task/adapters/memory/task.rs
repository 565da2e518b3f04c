//! In-memory repository for tasks, comments, and history.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

use crate::directory::domain::{RoleId, UserId};
use crate::task::{
    domain::{
        CommentId, HistoryAction, HistoryId, HistoryRecord, NewComment, NewTask, Subtask, SubtaskId, Task,
        TaskComment, TaskHistoryEntry, TaskId, TaskStatus, normalize_subtask_title,
    },
    ports::{
        TaskMutation, TaskRepository, TaskRepositoryError, TaskRepositoryResult,
        repository::{is_responsible, sort_for_listing},
    },
};

/// Thread-safe in-memory task repository.
///
/// A single lock guards all tables, so every operation is atomic.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<InMemoryTaskState>>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: HashMap<TaskId, Task>,
    comments: HashMap<TaskId, Vec<TaskComment>>,
    history: HashMap<TaskId, Vec<TaskHistoryEntry>>,
    sequences: Sequences,
}

#[derive(Debug, Default)]
struct Sequences {
    task: i64,
    subtask: i64,
    comment: i64,
    history: i64,
}

impl Sequences {
    fn next(counter: &mut i64) -> TaskRepositoryResult<i64> {
        *counter = counter
            .checked_add(1)
            .ok_or_else(|| TaskRepositoryError::persistence(std::io::Error::other("sequence exhausted")))?;
        Ok(*counter)
    }

    fn task_id(&mut self) -> TaskRepositoryResult<TaskId> {
        TaskId::new(Self::next(&mut self.task)?).map_err(TaskRepositoryError::Rejected)
    }

    fn subtask_id(&mut self) -> TaskRepositoryResult<SubtaskId> {
        SubtaskId::new(Self::next(&mut self.subtask)?).map_err(TaskRepositoryError::Rejected)
    }

    fn comment_id(&mut self) -> TaskRepositoryResult<CommentId> {
        CommentId::new(Self::next(&mut self.comment)?).map_err(TaskRepositoryError::Rejected)
    }

    fn history_id(&mut self) -> TaskRepositoryResult<HistoryId> {
        HistoryId::new(Self::next(&mut self.history)?).map_err(TaskRepositoryError::Rejected)
    }
}

impl InMemoryTaskState {
    fn append_history(
        &mut self,
        task_id: TaskId,
        records: Vec<HistoryRecord>,
    ) -> TaskRepositoryResult<()> {
        let mut entries = Vec::with_capacity(records.len());
        for record in records {
            entries.push(record.into_entry(self.sequences.history_id()?, task_id));
        }
        self.history.entry(task_id).or_default().extend(entries);
        Ok(())
    }

    fn filtered(&self, predicate: impl Fn(&Task) -> bool) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .tasks
            .values()
            .filter(|task| predicate(task))
            .cloned()
            .collect();
        sort_for_listing(&mut tasks);
        tasks
    }
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl ToString) -> TaskRepositoryError {
    TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn create(&self, task: NewTask) -> TaskRepositoryResult<Task> {
        let mut state = self.state.write().map_err(lock_error)?;
        let task_id = state.sequences.task_id()?;
        let mut subtask_ids = Vec::with_capacity(task.subtasks().len());
        for _ in task.subtasks() {
            subtask_ids.push(state.sequences.subtask_id()?);
        }
        let creation = task.creation_record();
        let created = task.into_task(task_id, subtask_ids);
        state.append_history(task_id, vec![creation])?;
        state.tasks.insert(task_id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn modify(&self, id: TaskId, mutation: TaskMutation) -> TaskRepositoryResult<Task> {
        let mut state = self.state.write().map_err(lock_error)?;
        let mut working = state
            .tasks
            .get(&id)
            .cloned()
            .ok_or(TaskRepositoryError::NotFound(id))?;
        let records = mutation(&mut working).map_err(TaskRepositoryError::Rejected)?;
        state.append_history(id, records)?;
        state.tasks.insert(id, working.clone());
        Ok(working)
    }

    async fn add_subtasks(
        &self,
        id: TaskId,
        titles: Vec<String>,
        actor: UserId,
        now: DateTime<Utc>,
    ) -> TaskRepositoryResult<Task> {
        let mut state = self.state.write().map_err(lock_error)?;
        let mut working = state
            .tasks
            .get(&id)
            .cloned()
            .ok_or(TaskRepositoryError::NotFound(id))?;
        working.ensure_editable().map_err(TaskRepositoryError::Rejected)?;
        let mut subtasks = Vec::with_capacity(titles.len());
        for title in titles {
            let normalized = normalize_subtask_title(title).map_err(TaskRepositoryError::Rejected)?;
            let subtask_id = state.sequences.subtask_id()?;
            subtasks.push(Subtask::from_persisted(subtask_id, normalized, false, None, now));
        }
        let record = working
            .append_subtasks(subtasks, &actor, now)
            .map_err(TaskRepositoryError::Rejected)?;
        state.append_history(id, vec![record])?;
        state.tasks.insert(id, working.clone());
        Ok(working)
    }

    async fn delete(&self, id: TaskId) -> TaskRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if state.tasks.remove(&id).is_none() {
            return Err(TaskRepositoryError::NotFound(id));
        }
        state.comments.remove(&id);
        state.history.remove(&id);
        Ok(())
    }

    async fn append_comment(&self, comment: NewComment) -> TaskRepositoryResult<TaskComment> {
        let mut state = self.state.write().map_err(lock_error)?;
        let task_id = comment.task_id();
        if !state.tasks.contains_key(&task_id) {
            return Err(TaskRepositoryError::NotFound(task_id));
        }
        let record = HistoryRecord::new(
            comment.author().clone(),
            HistoryAction::CommentAdded,
            None,
            Some(comment.text().to_owned()),
            comment.created_at(),
        );
        let stored = comment.into_comment(state.sequences.comment_id()?);
        state.append_history(task_id, vec![record])?;
        state.comments.entry(task_id).or_default().push(stored.clone());
        Ok(stored)
    }

    async fn comments(&self, id: TaskId) -> TaskRepositoryResult<Vec<TaskComment>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.comments.get(&id).cloned().unwrap_or_default())
    }

    async fn history(&self, id: TaskId) -> TaskRepositoryResult<Vec<TaskHistoryEntry>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.history.get(&id).cloned().unwrap_or_default())
    }

    async fn list_responsible(
        &self,
        user: &UserId,
        roles: &BTreeSet<RoleId>,
        statuses: &[TaskStatus],
    ) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.filtered(|task| {
            statuses.contains(&task.status()) && is_responsible(task, user, roles)
        }))
    }

    async fn list_created_by(&self, user: &UserId) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.state.read().map_err(lock_error)?;
        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|task| task.creator() == user)
            .cloned()
            .collect();
        tasks.sort_by(|left, right| right.id().cmp(&left.id()));
        Ok(tasks)
    }

    async fn list_with_interval(&self) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.filtered(|task| {
            task.status().is_open() && task.notification_interval().is_some()
        }))
    }

    async fn list_active_due_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.filtered(|task| {
            task.status() == TaskStatus::Active
                && task.due_date().is_some_and(|due| due >= start && due < end)
        }))
    }

    async fn list_active_with_due_date(&self) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.filtered(|task| {
            task.status() == TaskStatus::Active && task.due_date().is_some()
        }))
    }
}
