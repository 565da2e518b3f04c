//! Diesel row models for task persistence.

use super::schema::{subtasks, task_comments, task_history, tasks};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: i64,
    /// Title.
    pub title: String,
    /// Description.
    pub description: Option<String>,
    /// Creator identity.
    pub creator_id: String,
    /// Direct assignee.
    pub assignee_id: Option<String>,
    /// Assigned role.
    pub assigned_role_id: Option<i64>,
    /// Lifecycle status.
    pub status: String,
    /// Due instant.
    pub due_date: Option<DateTime<Utc>>,
    /// Reminder interval in minutes.
    pub notification_interval_minutes: Option<i32>,
    /// Last delivered interval reminder.
    pub last_notified_at: Option<DateTime<Utc>>,
    /// Denormalised progress counter.
    pub progress: Option<String>,
    /// Attachments JSON.
    pub attachments: Value,
    /// Report text.
    pub report_text: Option<String>,
    /// Report attachments JSON.
    pub report_attachments: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Completion timestamp.
    pub closed_at: Option<DateTime<Utc>>,
}

/// Insert and update model for task records.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(treat_none_as_null = true)]
pub struct TaskValues {
    /// Title.
    pub title: String,
    /// Description.
    pub description: Option<String>,
    /// Creator identity.
    pub creator_id: String,
    /// Direct assignee.
    pub assignee_id: Option<String>,
    /// Assigned role.
    pub assigned_role_id: Option<i64>,
    /// Lifecycle status.
    pub status: String,
    /// Due instant.
    pub due_date: Option<DateTime<Utc>>,
    /// Reminder interval in minutes.
    pub notification_interval_minutes: Option<i32>,
    /// Last delivered interval reminder.
    pub last_notified_at: Option<DateTime<Utc>>,
    /// Denormalised progress counter.
    pub progress: Option<String>,
    /// Attachments JSON.
    pub attachments: Value,
    /// Report text.
    pub report_text: Option<String>,
    /// Report attachments JSON.
    pub report_attachments: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Completion timestamp.
    pub closed_at: Option<DateTime<Utc>>,
}

/// Query result row for subtasks.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = subtasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SubtaskRow {
    /// Subtask identifier.
    pub id: i64,
    /// Owning task.
    pub task_id: i64,
    /// Title.
    pub title: String,
    /// Completion flag.
    pub is_completed: bool,
    /// Completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Insert model for subtasks.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = subtasks)]
pub struct NewSubtaskRow {
    /// Owning task.
    pub task_id: i64,
    /// Title.
    pub title: String,
    /// Completion flag.
    pub is_completed: bool,
    /// Completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Query result row for comments.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = task_comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CommentRow {
    /// Comment identifier.
    pub id: i64,
    /// Owning task.
    pub task_id: i64,
    /// Author identity.
    pub author_id: String,
    /// Body.
    pub body: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert model for comments.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = task_comments)]
pub struct NewCommentRow {
    /// Owning task.
    pub task_id: i64,
    /// Author identity.
    pub author_id: String,
    /// Body.
    pub body: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Query result row for history entries.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = task_history)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct HistoryRow {
    /// Entry identifier.
    pub id: i64,
    /// Owning task.
    pub task_id: i64,
    /// Actor identity.
    pub actor_id: String,
    /// Change kind.
    pub action: String,
    /// Value before the change.
    pub old_value: Option<String>,
    /// Value after the change.
    pub new_value: Option<String>,
    /// Commit timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert model for history entries.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = task_history)]
pub struct NewHistoryRow {
    /// Owning task.
    pub task_id: i64,
    /// Actor identity.
    pub actor_id: String,
    /// Change kind.
    pub action: String,
    /// Value before the change.
    pub old_value: Option<String>,
    /// Value after the change.
    pub new_value: Option<String>,
    /// Commit timestamp.
    pub created_at: DateTime<Utc>,
}
