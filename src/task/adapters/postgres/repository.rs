//! `PostgreSQL` repository implementation for task storage.

use super::{
    models::{
        CommentRow, HistoryRow, NewCommentRow, NewHistoryRow, NewSubtaskRow, SubtaskRow,
        TaskRow, TaskValues,
    },
    schema::{subtasks, task_comments, task_history, tasks},
};
use crate::directory::domain::{RoleId, UserId};
use crate::task::{
    domain::{
        Assignment, BlobRef, CommentId, HistoryAction, HistoryId, HistoryRecord, NewComment,
        NewTask, NotificationInterval, PersistedTaskData, Subtask, SubtaskId, Task, TaskComment,
        TaskHistoryEntry, TaskId, TaskStatus,
    },
    ports::{
        TaskMutation, TaskRepository, TaskRepositoryError, TaskRepositoryResult,
        repository::sort_for_listing,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::Error as DieselError;
use std::collections::{BTreeSet, HashMap};

/// `PostgreSQL` connection pool type used by task adapters.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed task repository.
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: TaskPgPool,
}

impl PostgresTaskRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskRepositoryError::persistence)?
    }
}

impl From<DieselError> for TaskRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

const OPEN_STATUSES: [TaskStatus; 2] = [TaskStatus::Active, TaskStatus::PendingReview];

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn create(&self, task: NewTask) -> TaskRepositoryResult<Task> {
        self.run_blocking(move |connection| {
            connection.transaction::<_, TaskRepositoryError, _>(|tx| {
                let values = new_task_values(&task)?;
                let task_id: i64 = diesel::insert_into(tasks::table)
                    .values(&values)
                    .returning(tasks::id)
                    .get_result(tx)?;
                let subtask_rows: Vec<NewSubtaskRow> = task
                    .subtasks()
                    .iter()
                    .map(|title| NewSubtaskRow {
                        task_id,
                        title: title.clone(),
                        is_completed: false,
                        completed_at: None,
                    })
                    .collect();
                if !subtask_rows.is_empty() {
                    diesel::insert_into(subtasks::table)
                        .values(&subtask_rows)
                        .execute(tx)?;
                }
                let id = to_task_id(task_id)?;
                insert_history(tx, id, vec![task.creation_record()])?;
                let created = load_task(tx, id, false)?.ok_or(TaskRepositoryError::NotFound(id))?;
                write_progress(tx, &created)?;
                Ok(created)
            })
        })
        .await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        self.run_blocking(move |connection| load_task(connection, id, false))
            .await
    }

    async fn modify(&self, id: TaskId, mutation: TaskMutation) -> TaskRepositoryResult<Task> {
        self.run_blocking(move |connection| {
            connection.transaction::<_, TaskRepositoryError, _>(|tx| {
                let original = load_task(tx, id, true)?.ok_or(TaskRepositoryError::NotFound(id))?;
                let mut working = original.clone();
                let records = mutation(&mut working).map_err(TaskRepositoryError::Rejected)?;
                diesel::update(tasks::table.find(id.value()))
                    .set(&task_values(&working)?)
                    .execute(tx)?;
                write_changed_subtasks(tx, &original, &working)?;
                insert_history(tx, id, records)?;
                Ok(working)
            })
        })
        .await
    }

    async fn add_subtasks(
        &self,
        id: TaskId,
        titles: Vec<String>,
        actor: UserId,
        now: DateTime<Utc>,
    ) -> TaskRepositoryResult<Task> {
        self.run_blocking(move |connection| {
            connection.transaction::<_, TaskRepositoryError, _>(|tx| {
                let mut working =
                    load_task(tx, id, true)?.ok_or(TaskRepositoryError::NotFound(id))?;
                working.ensure_editable().map_err(TaskRepositoryError::Rejected)?;
                let rows = titles
                    .into_iter()
                    .map(|title| {
                        crate::task::domain::normalize_subtask_title(title)
                            .map(|normalized| NewSubtaskRow {
                                task_id: id.value(),
                                title: normalized,
                                is_completed: false,
                                completed_at: None,
                            })
                            .map_err(TaskRepositoryError::Rejected)
                    })
                    .collect::<TaskRepositoryResult<Vec<_>>>()?;
                let inserted: Vec<SubtaskRow> = if rows.is_empty() {
                    Vec::new()
                } else {
                    diesel::insert_into(subtasks::table)
                        .values(&rows)
                        .returning(SubtaskRow::as_returning())
                        .get_results(tx)?
                };
                let created = inserted
                    .into_iter()
                    .map(|row| row_to_subtask(row, now))
                    .collect::<TaskRepositoryResult<Vec<_>>>()?;
                let record = working
                    .append_subtasks(created, &actor, now)
                    .map_err(TaskRepositoryError::Rejected)?;
                diesel::update(tasks::table.find(id.value()))
                    .set(&task_values(&working)?)
                    .execute(tx)?;
                insert_history(tx, id, vec![record])?;
                Ok(working)
            })
        })
        .await
    }

    async fn delete(&self, id: TaskId) -> TaskRepositoryResult<()> {
        self.run_blocking(move |connection| {
            connection.transaction::<_, TaskRepositoryError, _>(|tx| {
                diesel::delete(task_history::table.filter(task_history::task_id.eq(id.value())))
                    .execute(tx)?;
                diesel::delete(task_comments::table.filter(task_comments::task_id.eq(id.value())))
                    .execute(tx)?;
                diesel::delete(subtasks::table.filter(subtasks::task_id.eq(id.value())))
                    .execute(tx)?;
                let removed = diesel::delete(tasks::table.find(id.value())).execute(tx)?;
                if removed == 0 {
                    return Err(TaskRepositoryError::NotFound(id));
                }
                Ok(())
            })
        })
        .await
    }

    async fn append_comment(&self, comment: NewComment) -> TaskRepositoryResult<TaskComment> {
        self.run_blocking(move |connection| {
            connection.transaction::<_, TaskRepositoryError, _>(|tx| {
                let task_id = comment.task_id();
                let exists = diesel::select(diesel::dsl::exists(tasks::table.find(task_id.value())))
                    .get_result::<bool>(tx)?;
                if !exists {
                    return Err(TaskRepositoryError::NotFound(task_id));
                }
                let row: CommentRow = diesel::insert_into(task_comments::table)
                    .values(&NewCommentRow {
                        task_id: task_id.value(),
                        author_id: comment.author().as_str().to_owned(),
                        body: comment.text().to_owned(),
                        created_at: comment.created_at(),
                    })
                    .returning(CommentRow::as_returning())
                    .get_result(tx)?;
                insert_history(
                    tx,
                    task_id,
                    vec![HistoryRecord::new(
                        comment.author().clone(),
                        HistoryAction::CommentAdded,
                        None,
                        Some(comment.text().to_owned()),
                        comment.created_at(),
                    )],
                )?;
                row_to_comment(row)
            })
        })
        .await
    }

    async fn comments(&self, id: TaskId) -> TaskRepositoryResult<Vec<TaskComment>> {
        self.run_blocking(move |connection| {
            let rows = task_comments::table
                .filter(task_comments::task_id.eq(id.value()))
                .order((task_comments::created_at.asc(), task_comments::id.asc()))
                .select(CommentRow::as_select())
                .load::<CommentRow>(connection)?;
            rows.into_iter().map(row_to_comment).collect()
        })
        .await
    }

    async fn history(&self, id: TaskId) -> TaskRepositoryResult<Vec<TaskHistoryEntry>> {
        self.run_blocking(move |connection| {
            let rows = task_history::table
                .filter(task_history::task_id.eq(id.value()))
                .order((task_history::created_at.asc(), task_history::id.asc()))
                .select(HistoryRow::as_select())
                .load::<HistoryRow>(connection)?;
            rows.into_iter().map(row_to_history).collect()
        })
        .await
    }

    async fn list_responsible(
        &self,
        user: &UserId,
        roles: &BTreeSet<RoleId>,
        statuses: &[TaskStatus],
    ) -> TaskRepositoryResult<Vec<Task>> {
        let user_id = user.as_str().to_owned();
        let role_ids: Vec<i64> = roles.iter().map(|role| role.value()).collect();
        let status_names = status_names(statuses);
        self.run_blocking(move |connection| {
            let rows = tasks::table
                .filter(tasks::status.eq_any(status_names))
                .filter(
                    tasks::assignee_id
                        .eq(user_id)
                        .or(tasks::assigned_role_id.eq_any(role_ids)),
                )
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?;
            rows_to_tasks(connection, rows)
        })
        .await
    }

    async fn list_created_by(&self, user: &UserId) -> TaskRepositoryResult<Vec<Task>> {
        let user_id = user.as_str().to_owned();
        self.run_blocking(move |connection| {
            let rows = tasks::table
                .filter(tasks::creator_id.eq(user_id))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?;
            let mut listed = rows_to_tasks(connection, rows)?;
            listed.sort_by(|left, right| right.id().cmp(&left.id()));
            Ok(listed)
        })
        .await
    }

    async fn list_with_interval(&self) -> TaskRepositoryResult<Vec<Task>> {
        self.run_blocking(|connection| {
            let rows = tasks::table
                .filter(tasks::status.eq_any(status_names(&OPEN_STATUSES)))
                .filter(tasks::notification_interval_minutes.is_not_null())
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?;
            rows_to_tasks(connection, rows)
        })
        .await
    }

    async fn list_active_due_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> TaskRepositoryResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            let rows = tasks::table
                .filter(tasks::status.eq(TaskStatus::Active.as_str()))
                .filter(tasks::due_date.ge(start))
                .filter(tasks::due_date.lt(end))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?;
            rows_to_tasks(connection, rows)
        })
        .await
    }

    async fn list_active_with_due_date(&self) -> TaskRepositoryResult<Vec<Task>> {
        self.run_blocking(|connection| {
            let rows = tasks::table
                .filter(tasks::status.eq(TaskStatus::Active.as_str()))
                .filter(tasks::due_date.is_not_null())
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?;
            rows_to_tasks(connection, rows)
        })
        .await
    }
}

fn status_names(statuses: &[TaskStatus]) -> Vec<String> {
    statuses
        .iter()
        .map(|status| status.as_str().to_owned())
        .collect()
}

fn to_task_id(value: i64) -> TaskRepositoryResult<TaskId> {
    TaskId::new(value).map_err(TaskRepositoryError::persistence)
}

fn load_task(
    connection: &mut PgConnection,
    id: TaskId,
    lock: bool,
) -> TaskRepositoryResult<Option<Task>> {
    let query = tasks::table
        .find(id.value())
        .select(TaskRow::as_select());
    let row = if lock {
        query.for_update().first::<TaskRow>(connection).optional()?
    } else {
        query.first::<TaskRow>(connection).optional()?
    };
    let Some(task_row) = row else {
        return Ok(None);
    };
    let mut loaded = rows_to_tasks(connection, vec![task_row])?;
    Ok(loaded.pop())
}

fn rows_to_tasks(connection: &mut PgConnection, rows: Vec<TaskRow>) -> TaskRepositoryResult<Vec<Task>> {
    let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
    let subtask_rows = subtasks::table
        .filter(subtasks::task_id.eq_any(ids))
        .order(subtasks::id.asc())
        .select(SubtaskRow::as_select())
        .load::<SubtaskRow>(connection)?;
    let mut grouped: HashMap<i64, Vec<SubtaskRow>> = HashMap::new();
    for subtask in subtask_rows {
        grouped.entry(subtask.task_id).or_default().push(subtask);
    }
    let mut listed = rows
        .into_iter()
        .map(|row| {
            let children = grouped.remove(&row.id).unwrap_or_default();
            row_to_task(row, children)
        })
        .collect::<TaskRepositoryResult<Vec<Task>>>()?;
    sort_for_listing(&mut listed);
    Ok(listed)
}

fn row_to_subtask(row: SubtaskRow, fallback: DateTime<Utc>) -> TaskRepositoryResult<Subtask> {
    let id = SubtaskId::new(row.id).map_err(TaskRepositoryError::persistence)?;
    Ok(Subtask::from_persisted(
        id,
        row.title,
        row.is_completed,
        row.completed_at,
        fallback,
    ))
}

fn row_to_task(row: TaskRow, subtask_rows: Vec<SubtaskRow>) -> TaskRepositoryResult<Task> {
    let assignee = row
        .assignee_id
        .map(UserId::new)
        .transpose()
        .map_err(TaskRepositoryError::persistence)?;
    let role = row
        .assigned_role_id
        .map(RoleId::new)
        .transpose()
        .map_err(TaskRepositoryError::persistence)?;
    let assignment =
        Assignment::from_columns(assignee, role).map_err(TaskRepositoryError::persistence)?;
    let interval = row
        .notification_interval_minutes
        .map(|minutes| {
            u32::try_from(minutes)
                .map_err(TaskRepositoryError::persistence)
                .and_then(|value| {
                    NotificationInterval::from_minutes(value)
                        .map_err(TaskRepositoryError::persistence)
                })
        })
        .transpose()?;
    let subtasks = subtask_rows
        .into_iter()
        .map(|subtask| row_to_subtask(subtask, row.updated_at))
        .collect::<TaskRepositoryResult<Vec<_>>>()?;

    Ok(Task::from_persisted(PersistedTaskData {
        id: to_task_id(row.id)?,
        title: row.title,
        description: row.description,
        creator: UserId::new(row.creator_id).map_err(TaskRepositoryError::persistence)?,
        assignment,
        status: TaskStatus::try_from(row.status.as_str())
            .map_err(TaskRepositoryError::persistence)?,
        due_date: row.due_date,
        notification_interval: interval,
        last_notified_at: row.last_notified_at,
        subtasks,
        attachments: decode_blobs(row.attachments)?,
        report_text: row.report_text,
        report_attachments: decode_blobs(row.report_attachments)?,
        created_at: row.created_at,
        updated_at: row.updated_at,
        closed_at: row.closed_at,
    }))
}

fn decode_blobs(value: serde_json::Value) -> TaskRepositoryResult<Vec<BlobRef>> {
    serde_json::from_value(value).map_err(TaskRepositoryError::persistence)
}

fn encode_blobs(blobs: &[BlobRef]) -> TaskRepositoryResult<serde_json::Value> {
    serde_json::to_value(blobs).map_err(TaskRepositoryError::persistence)
}

fn encode_interval(interval: Option<NotificationInterval>) -> TaskRepositoryResult<Option<i32>> {
    interval
        .map(|value| i32::try_from(value.minutes()).map_err(TaskRepositoryError::persistence))
        .transpose()
}

fn new_task_values(task: &NewTask) -> TaskRepositoryResult<TaskValues> {
    Ok(TaskValues {
        title: task.title().to_owned(),
        description: task.description().map(str::to_owned),
        creator_id: task.creator().as_str().to_owned(),
        assignee_id: task.assignment().assignee().map(|user| user.as_str().to_owned()),
        assigned_role_id: task.assignment().role().map(RoleId::value),
        status: TaskStatus::Active.as_str().to_owned(),
        due_date: task.due_date(),
        notification_interval_minutes: encode_interval(task.notification_interval())?,
        last_notified_at: None,
        progress: None,
        attachments: encode_blobs(task.attachments())?,
        report_text: None,
        report_attachments: encode_blobs(&[])?,
        created_at: task.created_at(),
        updated_at: task.created_at(),
        closed_at: None,
    })
}

fn task_values(task: &Task) -> TaskRepositoryResult<TaskValues> {
    Ok(TaskValues {
        title: task.title().to_owned(),
        description: task.description().map(str::to_owned),
        creator_id: task.creator().as_str().to_owned(),
        assignee_id: task.assignment().assignee().map(|user| user.as_str().to_owned()),
        assigned_role_id: task.assignment().role().map(RoleId::value),
        status: task.status().as_str().to_owned(),
        due_date: task.due_date(),
        notification_interval_minutes: encode_interval(task.notification_interval())?,
        last_notified_at: task.last_notified_at(),
        progress: task.progress().map(|progress| progress.to_string()),
        attachments: encode_blobs(task.attachments())?,
        report_text: task.report_text().map(str::to_owned),
        report_attachments: encode_blobs(task.report_attachments())?,
        created_at: task.created_at(),
        updated_at: task.updated_at(),
        closed_at: task.closed_at(),
    })
}

fn write_progress(connection: &mut PgConnection, task: &Task) -> TaskRepositoryResult<()> {
    diesel::update(tasks::table.find(task.id().value()))
        .set(tasks::progress.eq(task.progress().map(|progress| progress.to_string())))
        .execute(connection)?;
    Ok(())
}

fn write_changed_subtasks(
    connection: &mut PgConnection,
    original: &Task,
    updated: &Task,
) -> TaskRepositoryResult<()> {
    for subtask in updated.subtasks() {
        let unchanged = original
            .subtasks()
            .iter()
            .any(|before| before == subtask);
        if unchanged {
            continue;
        }
        diesel::update(subtasks::table.find(subtask.id().value()))
            .set((
                subtasks::is_completed.eq(subtask.is_completed()),
                subtasks::completed_at.eq(subtask.completed_at()),
            ))
            .execute(connection)?;
    }
    Ok(())
}

fn insert_history(
    connection: &mut PgConnection,
    task_id: TaskId,
    records: Vec<HistoryRecord>,
) -> TaskRepositoryResult<()> {
    if records.is_empty() {
        return Ok(());
    }
    let rows: Vec<NewHistoryRow> = records
        .into_iter()
        .map(|record| NewHistoryRow {
            task_id: task_id.value(),
            actor_id: record.actor.as_str().to_owned(),
            action: record.action.as_str().to_owned(),
            old_value: record.old_value,
            new_value: record.new_value,
            created_at: record.created_at,
        })
        .collect();
    diesel::insert_into(task_history::table)
        .values(&rows)
        .execute(connection)?;
    Ok(())
}

fn row_to_comment(row: CommentRow) -> TaskRepositoryResult<TaskComment> {
    Ok(TaskComment {
        id: CommentId::new(row.id).map_err(TaskRepositoryError::persistence)?,
        task_id: to_task_id(row.task_id)?,
        author: UserId::new(row.author_id).map_err(TaskRepositoryError::persistence)?,
        text: row.body,
        created_at: row.created_at,
    })
}

fn row_to_history(row: HistoryRow) -> TaskRepositoryResult<TaskHistoryEntry> {
    Ok(TaskHistoryEntry {
        id: HistoryId::new(row.id).map_err(TaskRepositoryError::persistence)?,
        task_id: to_task_id(row.task_id)?,
        actor: UserId::new(row.actor_id).map_err(TaskRepositoryError::persistence)?,
        action: HistoryAction::try_from(row.action.as_str())
            .map_err(TaskRepositoryError::persistence)?,
        old_value: row.old_value,
        new_value: row.new_value,
        created_at: row.created_at,
    })
}
