//! Task aggregate root and its lifecycle state machine.

use super::{
    Assignment, BlobRef, HistoryAction, HistoryRecord, NotificationInterval, Progress, Subtask,
    SubtaskId, TaskAction, TaskDomainError, TaskId, TaskStatus, normalize_subtask_title,
};
use crate::directory::domain::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Report attached to a review submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    text: Option<String>,
    attachments: Vec<BlobRef>,
}

impl TaskReport {
    /// Minimum length of a text-only report, in characters.
    pub const MIN_TEXT_CHARS: usize = 10;

    /// Validates a report.
    ///
    /// A report is accepted when it carries at least one attachment, or when
    /// its trimmed text has at least [`Self::MIN_TEXT_CHARS`] characters.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::ReportMissing`] when both parts are empty
    /// and [`TaskDomainError::ReportTooShort`] for short text without
    /// attachments.
    pub fn new(text: Option<String>, attachments: Vec<BlobRef>) -> Result<Self, TaskDomainError> {
        let trimmed = text
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_owned);
        if attachments.is_empty() {
            match trimmed.as_deref() {
                None => return Err(TaskDomainError::ReportMissing),
                Some(value) if value.chars().count() < Self::MIN_TEXT_CHARS => {
                    return Err(TaskDomainError::ReportTooShort {
                        min: Self::MIN_TEXT_CHARS,
                    });
                }
                Some(_) => {}
            }
        }
        Ok(Self {
            text: trimmed,
            attachments,
        })
    }

    /// Returns the report text.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Returns the report attachments.
    #[must_use]
    pub fn attachments(&self) -> &[BlobRef] {
        &self.attachments
    }
}

/// Validated task awaiting its first write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    title: String,
    description: Option<String>,
    creator: UserId,
    assignment: Assignment,
    due_date: Option<DateTime<Utc>>,
    notification_interval: Option<NotificationInterval>,
    subtasks: Vec<String>,
    attachments: Vec<BlobRef>,
    created_at: DateTime<Utc>,
}

fn normalize_title(title: impl Into<String>) -> Result<String, TaskDomainError> {
    let raw = title.into();
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TaskDomainError::EmptyTitle);
    }
    Ok(trimmed.to_owned())
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

impl NewTask {
    /// Creates a task draft with required fields.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] when the title is blank.
    pub fn new(
        title: impl Into<String>,
        creator: UserId,
        assignment: Assignment,
        created_at: DateTime<Utc>,
    ) -> Result<Self, TaskDomainError> {
        Ok(Self {
            title: normalize_title(title)?,
            description: None,
            creator,
            assignment,
            due_date: None,
            notification_interval: None,
            subtasks: Vec::new(),
            attachments: Vec::new(),
            created_at,
        })
    }

    /// Sets the description; blank text means no description.
    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = normalize_description(description);
        self
    }

    /// Sets the initial subtasks.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptySubtaskTitle`] when any title is blank.
    pub fn with_subtasks(
        mut self,
        titles: impl IntoIterator<Item = String>,
    ) -> Result<Self, TaskDomainError> {
        self.subtasks = titles
            .into_iter()
            .map(normalize_subtask_title)
            .collect::<Result<_, _>>()?;
        Ok(self)
    }

    /// Sets the task attachments.
    #[must_use]
    pub fn with_attachments(mut self, attachments: Vec<BlobRef>) -> Self {
        self.attachments = attachments;
        self
    }

    /// Sets the due date.
    #[must_use]
    pub fn with_due_date(mut self, due_date: Option<DateTime<Utc>>) -> Self {
        self.due_date = due_date;
        self
    }

    /// Sets the reminder interval.
    #[must_use]
    pub fn with_notification_interval(
        mut self,
        interval: Option<NotificationInterval>,
    ) -> Self {
        self.notification_interval = interval;
        self
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the creator.
    #[must_use]
    pub const fn creator(&self) -> &UserId {
        &self.creator
    }

    /// Returns the assignment.
    #[must_use]
    pub const fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    /// Returns the due date.
    #[must_use]
    pub const fn due_date(&self) -> Option<DateTime<Utc>> {
        self.due_date
    }

    /// Returns the reminder interval.
    #[must_use]
    pub const fn notification_interval(&self) -> Option<NotificationInterval> {
        self.notification_interval
    }

    /// Returns the initial subtask titles.
    #[must_use]
    pub fn subtasks(&self) -> &[String] {
        &self.subtasks
    }

    /// Returns the attachments.
    #[must_use]
    pub fn attachments(&self) -> &[BlobRef] {
        &self.attachments
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// History entry written together with the task.
    #[must_use]
    pub fn creation_record(&self) -> HistoryRecord {
        HistoryRecord::new(
            self.creator.clone(),
            HistoryAction::Created,
            None,
            Some(self.title.clone()),
            self.created_at,
        )
    }

    /// Materialises the task once storage has assigned identifiers.
    ///
    /// `subtask_ids` pairs with [`Self::subtasks`] in order.
    #[must_use]
    pub fn into_task(self, id: TaskId, subtask_ids: impl IntoIterator<Item = SubtaskId>) -> Task {
        let created_at = self.created_at;
        let subtasks = subtask_ids
            .into_iter()
            .zip(self.subtasks)
            .map(|(subtask_id, title)| {
                Subtask::from_persisted(subtask_id, title, false, None, created_at)
            })
            .collect();
        Task::from_persisted(PersistedTaskData {
            id,
            title: self.title,
            description: self.description,
            creator: self.creator,
            assignment: self.assignment,
            status: TaskStatus::Active,
            due_date: self.due_date,
            notification_interval: self.notification_interval,
            last_notified_at: None,
            subtasks,
            attachments: self.attachments,
            report_text: None,
            report_attachments: Vec::new(),
            created_at,
            updated_at: created_at,
            closed_at: None,
        })
    }
}

/// Task aggregate root.
///
/// Subtasks live inside the aggregate so that completion gates and the
/// progress counter are always evaluated against the same snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    title: String,
    description: Option<String>,
    creator: UserId,
    assignment: Assignment,
    status: TaskStatus,
    due_date: Option<DateTime<Utc>>,
    notification_interval: Option<NotificationInterval>,
    last_notified_at: Option<DateTime<Utc>>,
    progress: Option<Progress>,
    subtasks: Vec<Subtask>,
    attachments: Vec<BlobRef>,
    report_text: Option<String>,
    report_attachments: Vec<BlobRef>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted title.
    pub title: String,
    /// Persisted description.
    pub description: Option<String>,
    /// Persisted creator.
    pub creator: UserId,
    /// Persisted assignment.
    pub assignment: Assignment,
    /// Persisted status.
    pub status: TaskStatus,
    /// Persisted due date.
    pub due_date: Option<DateTime<Utc>>,
    /// Persisted reminder interval.
    pub notification_interval: Option<NotificationInterval>,
    /// Last reminder delivery.
    pub last_notified_at: Option<DateTime<Utc>>,
    /// Persisted subtasks in display order.
    pub subtasks: Vec<Subtask>,
    /// Persisted attachments.
    pub attachments: Vec<BlobRef>,
    /// Persisted report text.
    pub report_text: Option<String>,
    /// Persisted report attachments.
    pub report_attachments: Vec<BlobRef>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest change timestamp.
    pub updated_at: DateTime<Utc>,
    /// Completion timestamp.
    pub closed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Reconstructs a task from persisted storage.
    ///
    /// Progress is recomputed from the subtasks rather than trusted from
    /// storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        let progress = Progress::over(&data.subtasks);
        Self {
            id: data.id,
            title: data.title,
            description: data.description,
            creator: data.creator,
            assignment: data.assignment,
            status: data.status,
            due_date: data.due_date,
            notification_interval: data.notification_interval,
            last_notified_at: data.last_notified_at,
            progress,
            subtasks: data.subtasks,
            attachments: data.attachments,
            report_text: data.report_text,
            report_attachments: data.report_attachments,
            created_at: data.created_at,
            updated_at: data.updated_at,
            closed_at: data.closed_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the creator.
    #[must_use]
    pub const fn creator(&self) -> &UserId {
        &self.creator
    }

    /// Returns the assignment.
    #[must_use]
    pub const fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    /// Returns the status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the due date.
    #[must_use]
    pub const fn due_date(&self) -> Option<DateTime<Utc>> {
        self.due_date
    }

    /// Returns the reminder interval.
    #[must_use]
    pub const fn notification_interval(&self) -> Option<NotificationInterval> {
        self.notification_interval
    }

    /// Returns the last reminder delivery.
    #[must_use]
    pub const fn last_notified_at(&self) -> Option<DateTime<Utc>> {
        self.last_notified_at
    }

    /// Returns the progress counter, absent without subtasks.
    #[must_use]
    pub const fn progress(&self) -> Option<Progress> {
        self.progress
    }

    /// Returns the subtasks.
    #[must_use]
    pub fn subtasks(&self) -> &[Subtask] {
        &self.subtasks
    }

    /// Returns the attachments.
    #[must_use]
    pub fn attachments(&self) -> &[BlobRef] {
        &self.attachments
    }

    /// Returns the review report text.
    #[must_use]
    pub fn report_text(&self) -> Option<&str> {
        self.report_text.as_deref()
    }

    /// Returns the review report attachments.
    #[must_use]
    pub fn report_attachments(&self) -> &[BlobRef] {
        &self.report_attachments
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest change timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the completion timestamp.
    #[must_use]
    pub const fn closed_at(&self) -> Option<DateTime<Utc>> {
        self.closed_at
    }

    /// Returns `true` when the creator is also the direct assignee.
    #[must_use]
    pub fn is_self_assigned(&self) -> bool {
        self.assignment.is_user(&self.creator)
    }

    /// Returns `true` when an active task is past its due date.
    #[must_use]
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == TaskStatus::Active && self.due_date.is_some_and(|due| due < now)
    }

    /// Number of subtasks that are still open.
    #[must_use]
    pub fn remaining_subtasks(&self) -> usize {
        self.progress.map_or(0, Progress::remaining)
    }

    /// Fails with [`TaskDomainError::Closed`] unless the task is open.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::Closed`] for completed or cancelled tasks.
    pub const fn ensure_editable(&self) -> Result<(), TaskDomainError> {
        if self.status.is_open() {
            Ok(())
        } else {
            Err(TaskDomainError::Closed(self.status))
        }
    }

    /// Moves an active task to review with the given report.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTransition`] unless the task is
    /// active, [`TaskDomainError::CreatorCannotSubmit`] when the actor is
    /// the creator, and [`TaskDomainError::SubtasksIncomplete`] while
    /// subtasks are open.
    pub fn submit_for_review(
        &mut self,
        report: TaskReport,
        actor: &UserId,
        now: DateTime<Utc>,
    ) -> Result<HistoryRecord, TaskDomainError> {
        self.require_status(TaskStatus::Active, TaskAction::Submit)?;
        if self.is_self_assigned() || actor == &self.creator {
            return Err(TaskDomainError::CreatorCannotSubmit);
        }
        self.require_subtasks_done()?;
        self.report_text = report.text;
        self.report_attachments = report.attachments;
        Ok(self.change_status(TaskStatus::PendingReview, actor, now))
    }

    /// Completes a self-assigned task without review.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTransition`] unless the task is
    /// active, [`TaskDomainError::NotSoleAssignee`] unless the creator is the
    /// direct assignee, and [`TaskDomainError::SubtasksIncomplete`] while
    /// subtasks are open.
    pub fn complete_directly(
        &mut self,
        actor: &UserId,
        now: DateTime<Utc>,
    ) -> Result<HistoryRecord, TaskDomainError> {
        self.require_status(TaskStatus::Active, TaskAction::Complete)?;
        if !self.is_self_assigned() {
            return Err(TaskDomainError::NotSoleAssignee);
        }
        self.require_subtasks_done()?;
        self.closed_at = Some(now);
        Ok(self.change_status(TaskStatus::Completed, actor, now))
    }

    /// Accepts a submitted report.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTransition`] unless the task is
    /// pending review.
    pub fn confirm(
        &mut self,
        actor: &UserId,
        now: DateTime<Utc>,
    ) -> Result<HistoryRecord, TaskDomainError> {
        self.require_status(TaskStatus::PendingReview, TaskAction::Confirm)?;
        self.closed_at = Some(now);
        Ok(self.change_status(TaskStatus::Completed, actor, now))
    }

    /// Sends a submitted report back for rework and discards it.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTransition`] unless the task is
    /// pending review.
    pub fn reject(
        &mut self,
        actor: &UserId,
        now: DateTime<Utc>,
    ) -> Result<HistoryRecord, TaskDomainError> {
        self.require_status(TaskStatus::PendingReview, TaskAction::Reject)?;
        self.clear_report();
        Ok(self.change_status(TaskStatus::Active, actor, now))
    }

    /// Reopens a completed task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTransition`] unless the task is
    /// completed.
    pub fn reopen(
        &mut self,
        actor: &UserId,
        now: DateTime<Utc>,
    ) -> Result<HistoryRecord, TaskDomainError> {
        self.require_status(TaskStatus::Completed, TaskAction::Reopen)?;
        self.closed_at = None;
        self.clear_report();
        Ok(self.change_status(TaskStatus::Active, actor, now))
    }

    /// Cancels the task. Cancellation is terminal.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTransition`] for a task that is
    /// already cancelled.
    pub fn cancel(
        &mut self,
        actor: &UserId,
        now: DateTime<Utc>,
    ) -> Result<HistoryRecord, TaskDomainError> {
        if self.status == TaskStatus::Cancelled {
            return Err(TaskDomainError::InvalidTransition {
                from: self.status,
                action: TaskAction::Cancel,
            });
        }
        Ok(self.change_status(TaskStatus::Cancelled, actor, now))
    }

    /// Flips a subtask and recomputes progress.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::Closed`] for closed tasks and
    /// [`TaskDomainError::SubtaskNotFound`] for foreign subtasks.
    pub fn toggle_subtask(
        &mut self,
        subtask_id: SubtaskId,
        actor: &UserId,
        now: DateTime<Utc>,
    ) -> Result<HistoryRecord, TaskDomainError> {
        self.ensure_editable()?;
        let subtask = self
            .subtasks
            .iter_mut()
            .find(|subtask| subtask.id() == subtask_id)
            .ok_or(TaskDomainError::SubtaskNotFound(subtask_id))?;
        let completed = subtask.toggle(now);
        let title = subtask.title().to_owned();
        self.recompute_progress();
        self.updated_at = now;
        let marker = if completed { "done" } else { "open" };
        Ok(HistoryRecord::new(
            actor.clone(),
            HistoryAction::SubtaskToggled,
            Some(title),
            Some(marker.to_owned()),
            now,
        ))
    }

    /// Appends subtasks created by storage and recomputes progress.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::Closed`] for closed tasks.
    pub fn append_subtasks(
        &mut self,
        subtasks: Vec<Subtask>,
        actor: &UserId,
        now: DateTime<Utc>,
    ) -> Result<HistoryRecord, TaskDomainError> {
        self.ensure_editable()?;
        let titles: Vec<&str> = subtasks.iter().map(Subtask::title).collect();
        let summary = titles.join("; ");
        self.subtasks.extend(subtasks);
        self.recompute_progress();
        self.updated_at = now;
        Ok(HistoryRecord::new(
            actor.clone(),
            HistoryAction::SubtasksAdded,
            None,
            Some(summary),
            now,
        ))
    }

    /// Replaces the title.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::Closed`] for closed tasks and
    /// [`TaskDomainError::EmptyTitle`] for blank titles.
    pub fn rename(
        &mut self,
        title: impl Into<String>,
        actor: &UserId,
        now: DateTime<Utc>,
    ) -> Result<HistoryRecord, TaskDomainError> {
        self.ensure_editable()?;
        let next = normalize_title(title)?;
        let previous = std::mem::replace(&mut self.title, next.clone());
        self.updated_at = now;
        Ok(HistoryRecord::new(
            actor.clone(),
            HistoryAction::TitleChanged,
            Some(previous),
            Some(next),
            now,
        ))
    }

    /// Replaces the description; blank text clears it.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::Closed`] for closed tasks.
    pub fn set_description(
        &mut self,
        description: Option<String>,
        actor: &UserId,
        now: DateTime<Utc>,
    ) -> Result<HistoryRecord, TaskDomainError> {
        self.ensure_editable()?;
        let next = normalize_description(description);
        let previous = std::mem::replace(&mut self.description, next.clone());
        self.updated_at = now;
        Ok(HistoryRecord::new(
            actor.clone(),
            HistoryAction::DescriptionChanged,
            previous,
            next,
            now,
        ))
    }

    /// Replaces the due date.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::Closed`] for closed tasks.
    pub fn set_due_date(
        &mut self,
        due_date: Option<DateTime<Utc>>,
        actor: &UserId,
        now: DateTime<Utc>,
    ) -> Result<HistoryRecord, TaskDomainError> {
        self.ensure_editable()?;
        let previous = std::mem::replace(&mut self.due_date, due_date);
        self.updated_at = now;
        Ok(HistoryRecord::new(
            actor.clone(),
            HistoryAction::DueDateChanged,
            previous.map(|value| value.to_rfc3339()),
            due_date.map(|value| value.to_rfc3339()),
            now,
        ))
    }

    /// Replaces the reminder interval.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::Closed`] for closed tasks.
    pub fn set_notification_interval(
        &mut self,
        interval: Option<NotificationInterval>,
        actor: &UserId,
        now: DateTime<Utc>,
    ) -> Result<HistoryRecord, TaskDomainError> {
        self.ensure_editable()?;
        let previous = std::mem::replace(&mut self.notification_interval, interval);
        self.updated_at = now;
        Ok(HistoryRecord::new(
            actor.clone(),
            HistoryAction::IntervalChanged,
            previous.map(|value| value.minutes().to_string()),
            interval.map(|value| value.minutes().to_string()),
            now,
        ))
    }

    /// Hands the task to a different user or role.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::Closed`] for closed tasks.
    pub fn reassign(
        &mut self,
        assignment: Assignment,
        actor: &UserId,
        now: DateTime<Utc>,
    ) -> Result<HistoryRecord, TaskDomainError> {
        self.ensure_editable()?;
        let next = assignment.to_string();
        let previous = std::mem::replace(&mut self.assignment, assignment);
        self.updated_at = now;
        Ok(HistoryRecord::new(
            actor.clone(),
            HistoryAction::AssignmentChanged,
            Some(previous.to_string()),
            Some(next),
            now,
        ))
    }

    /// Records a delivered interval reminder.
    pub const fn record_notified(&mut self, now: DateTime<Utc>) {
        self.last_notified_at = Some(now);
    }

    fn require_status(&self, expected: TaskStatus, action: TaskAction) -> Result<(), TaskDomainError> {
        if self.status == expected {
            Ok(())
        } else {
            Err(TaskDomainError::InvalidTransition {
                from: self.status,
                action,
            })
        }
    }

    fn require_subtasks_done(&self) -> Result<(), TaskDomainError> {
        let remaining = self.remaining_subtasks();
        if remaining > 0 {
            return Err(TaskDomainError::SubtasksIncomplete { remaining });
        }
        Ok(())
    }

    fn change_status(&mut self, to: TaskStatus, actor: &UserId, now: DateTime<Utc>) -> HistoryRecord {
        let from = std::mem::replace(&mut self.status, to);
        self.updated_at = now;
        HistoryRecord::new(
            actor.clone(),
            HistoryAction::StatusChanged,
            Some(from.as_str().to_owned()),
            Some(to.as_str().to_owned()),
            now,
        )
    }

    fn clear_report(&mut self) {
        self.report_text = None;
        self.report_attachments.clear();
    }

    fn recompute_progress(&mut self) {
        self.progress = Progress::over(&self.subtasks);
    }
}
