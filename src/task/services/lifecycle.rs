//! Service layer for the task lifecycle.
//!
//! Every mutating operation follows the same shape: load the task, check
//! access, apply the domain mutation inside [`TaskRepository::modify`], then
//! run post-commit side effects. Side effects (notifications and due
//! reminder bookkeeping) are logged on failure and never undo the commit.

use super::{
    access::{AccessDenied, AccessGuard, AccessRequirement, DeletePolicy},
    resolver::AssignmentResolver,
};
use crate::directory::{
    domain::{RoleId, User, UserId},
    ports::{DirectoryError, UserDirectory},
};
use crate::notification::{
    ports::Notifier,
    services::{DeliveryReport, MessageRenderer, Template, dispatch},
};
use crate::reminder::domain::DueReminderJobs;
use crate::task::{
    domain::{
        Assignment, BlobRef, HistoryRecord, NewComment, NewTask, NotificationInterval,
        SubtaskId, Task, TaskComment, TaskDomainError, TaskHistoryEntry, TaskId, TaskReport,
        TaskStatus,
    },
    ports::{TaskRepository, TaskRepositoryError},
};
use chrono::{DateTime, Utc};
use minijinja::{Value, context};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    title: String,
    assignment: Assignment,
    description: Option<String>,
    subtasks: Vec<String>,
    attachments: Vec<BlobRef>,
    due_date: Option<DateTime<Utc>>,
    notification_interval: Option<NotificationInterval>,
}

impl CreateTaskRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(title: impl Into<String>, assignment: Assignment) -> Self {
        Self {
            title: title.into(),
            assignment,
            description: None,
            subtasks: Vec::new(),
            attachments: Vec::new(),
            due_date: None,
            notification_interval: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Sets the initial subtask titles.
    #[must_use]
    pub fn with_subtasks(mut self, subtasks: impl IntoIterator<Item = String>) -> Self {
        self.subtasks = subtasks.into_iter().collect();
        self
    }

    /// Sets the attachments.
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
    pub fn with_notification_interval(mut self, interval: Option<NotificationInterval>) -> Self {
        self.notification_interval = interval;
        self
    }
}

/// Service-level errors for task lifecycle operations.
#[derive(Debug, Error)]
pub enum TaskLifecycleError {
    /// The domain refused the operation.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// The task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The caller may not perform the operation.
    #[error(transparent)]
    AccessDenied(#[from] AccessDenied),

    /// The assignment names a user that is not registered.
    #[error("unknown user: {0}")]
    UnknownUser(UserId),

    /// The assignment names a role that does not exist.
    #[error("unknown role: {0}")]
    UnknownRole(RoleId),

    /// Task storage failed.
    #[error(transparent)]
    Repository(TaskRepositoryError),

    /// Directory storage failed.
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

impl TaskLifecycleError {
    /// Returns `true` for storage failures, as opposed to refusals the
    /// caller can act on.
    #[must_use]
    pub const fn is_infrastructure(&self) -> bool {
        matches!(self, Self::Repository(_) | Self::Directory(_))
    }
}

impl From<TaskRepositoryError> for TaskLifecycleError {
    fn from(err: TaskRepositoryError) -> Self {
        match err {
            TaskRepositoryError::NotFound(id) => Self::TaskNotFound(id),
            TaskRepositoryError::Rejected(domain) => Self::Domain(domain),
            TaskRepositoryError::Persistence(_) => Self::Repository(err),
        }
    }
}

/// Result type for task lifecycle service operations.
pub type TaskLifecycleResult<T> = Result<T, TaskLifecycleError>;

/// Task lifecycle orchestration service.
pub struct TaskLifecycleService<R, D, N, C>
where
    R: TaskRepository,
    D: UserDirectory,
    N: Notifier,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    directory: Arc<D>,
    notifier: Arc<N>,
    clock: Arc<C>,
    resolver: AssignmentResolver<D>,
    renderer: MessageRenderer,
    due_reminders: Arc<DueReminderJobs>,
    delete_policy: DeletePolicy,
}

impl<R, D, N, C> Clone for TaskLifecycleService<R, D, N, C>
where
    R: TaskRepository,
    D: UserDirectory,
    N: Notifier,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            directory: Arc::clone(&self.directory),
            notifier: Arc::clone(&self.notifier),
            clock: Arc::clone(&self.clock),
            resolver: self.resolver.clone(),
            renderer: self.renderer.clone(),
            due_reminders: Arc::clone(&self.due_reminders),
            delete_policy: self.delete_policy,
        }
    }
}

impl<R, D, N, C> TaskLifecycleService<R, D, N, C>
where
    R: TaskRepository,
    D: UserDirectory,
    N: Notifier,
    C: Clock + Send + Sync,
{
    /// Creates a service with the default delete policy and a private due
    /// reminder table.
    #[must_use]
    pub fn new(repository: Arc<R>, directory: Arc<D>, notifier: Arc<N>, clock: Arc<C>) -> Self {
        Self {
            repository,
            resolver: AssignmentResolver::new(Arc::clone(&directory)),
            directory,
            notifier,
            clock,
            renderer: MessageRenderer::new(),
            due_reminders: Arc::new(DueReminderJobs::default()),
            delete_policy: DeletePolicy::default(),
        }
    }

    /// Shares a due reminder table with the scheduler.
    #[must_use]
    pub fn with_due_reminders(mut self, due_reminders: Arc<DueReminderJobs>) -> Self {
        self.due_reminders = due_reminders;
        self
    }

    /// Sets the delete policy.
    #[must_use]
    pub fn with_delete_policy(mut self, policy: DeletePolicy) -> Self {
        self.delete_policy = policy;
        self
    }

    /// Returns the repository.
    #[must_use]
    pub const fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Returns the assignment resolver.
    #[must_use]
    pub const fn resolver(&self) -> &AssignmentResolver<D> {
        &self.resolver
    }

    /// Returns the due reminder table.
    #[must_use]
    pub const fn due_reminders(&self) -> &Arc<DueReminderJobs> {
        &self.due_reminders
    }

    /// Creates a task, its subtasks, and the creation history entry, then
    /// notifies the new responsible parties other than the creator.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::UnknownUser`] or
    /// [`TaskLifecycleError::UnknownRole`] for a dangling assignment, a
    /// domain error for invalid input, and storage errors otherwise.
    pub async fn create_task(
        &self,
        creator: &User,
        request: CreateTaskRequest,
    ) -> TaskLifecycleResult<Task> {
        self.ensure_assignment_target(&request.assignment).await?;
        let now = self.clock.utc();
        let draft = NewTask::new(request.title, creator.id().clone(), request.assignment, now)?
            .with_description(request.description)
            .with_subtasks(request.subtasks)?
            .with_attachments(request.attachments)
            .with_due_date(request.due_date)
            .with_notification_interval(request.notification_interval);
        let task = self.repository.create(draft).await?;
        info!(task_id = %task.id(), user_id = %creator.id(), "task created");
        self.due_reminders.schedule(&task, now);
        self.announce_assignment(&task, creator).await;
        Ok(task)
    }

    /// Looks up a task without access checks.
    ///
    /// # Errors
    ///
    /// Returns storage errors.
    pub async fn find_task(&self, id: TaskId) -> TaskLifecycleResult<Option<Task>> {
        Ok(self.repository.find_by_id(id).await?)
    }

    /// Loads a task the caller participates in.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::TaskNotFound`] or
    /// [`TaskLifecycleError::AccessDenied`].
    pub async fn view_task(&self, actor: &User, id: TaskId) -> TaskLifecycleResult<Task> {
        self.load_authorized(actor, id, AccessRequirement::Participant)
            .await
    }

    /// Lists open tasks the caller is responsible for.
    ///
    /// # Errors
    ///
    /// Returns storage errors.
    pub async fn list_responsible_tasks(&self, actor: &User) -> TaskLifecycleResult<Vec<Task>> {
        Ok(self
            .repository
            .list_responsible(
                actor.id(),
                actor.roles(),
                &[TaskStatus::Active, TaskStatus::PendingReview],
            )
            .await?)
    }

    /// Lists tasks the caller created, newest first.
    ///
    /// # Errors
    ///
    /// Returns storage errors.
    pub async fn list_created_tasks(&self, actor: &User) -> TaskLifecycleResult<Vec<Task>> {
        Ok(self.repository.list_created_by(actor.id()).await?)
    }

    /// Completes the task directly when the caller is its creator, otherwise
    /// submits it for review with `report`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::ReportMissing`] when a submission has no
    /// report, plus every error of the routed operation.
    pub async fn complete_or_submit(
        &self,
        actor: &User,
        id: TaskId,
        report: Option<TaskReport>,
    ) -> TaskLifecycleResult<Task> {
        let task = self
            .load_authorized(actor, id, AccessRequirement::Participant)
            .await?;
        if task.creator() == actor.id() {
            return self.complete_directly(actor, id).await;
        }
        let submitted = report.ok_or(TaskDomainError::ReportMissing)?;
        self.submit_for_review(actor, id, submitted).await
    }

    /// Moves an active task to review and notifies the creator.
    ///
    /// # Errors
    ///
    /// Returns the domain refusal when subtasks are open or the status is
    /// wrong, and access or storage errors otherwise.
    pub async fn submit_for_review(
        &self,
        actor: &User,
        id: TaskId,
        report: TaskReport,
    ) -> TaskLifecycleResult<Task> {
        let actor_id = actor.id().clone();
        let now = self.clock.utc();
        let task = self
            .mutate(actor, id, AccessRequirement::Participant, move |task| {
                task.submit_for_review(report, &actor_id, now)
            })
            .await?;
        info!(task_id = %id, user_id = %actor.id(), "task submitted for review");
        let attachments = task.report_attachments().len();
        self.notify(
            &task,
            vec![task.creator().clone()],
            Template::ReviewRequested,
            context! {
                title => task.title(),
                actor => actor.display_name(),
                report => task.report_text(),
                attachments => attachments,
            },
        )
        .await;
        Ok(task)
    }

    /// Completes a self-assigned task without review.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::NotSoleAssignee`] unless the creator is the
    /// direct assignee, plus the subtask gate and access errors.
    pub async fn complete_directly(&self, actor: &User, id: TaskId) -> TaskLifecycleResult<Task> {
        let actor_id = actor.id().clone();
        let now = self.clock.utc();
        let task = self
            .mutate(actor, id, AccessRequirement::Creator, move |task| {
                task.complete_directly(&actor_id, now)
            })
            .await?;
        info!(task_id = %id, user_id = %actor.id(), "task completed");
        Ok(task)
    }

    /// Accepts a submitted report and notifies the responsible parties other
    /// than the confirmer.
    ///
    /// # Errors
    ///
    /// Returns a domain error unless the task is pending review, plus access
    /// and storage errors.
    pub async fn confirm(&self, actor: &User, id: TaskId) -> TaskLifecycleResult<Task> {
        let actor_id = actor.id().clone();
        let now = self.clock.utc();
        let task = self
            .mutate(actor, id, AccessRequirement::Creator, move |task| {
                task.confirm(&actor_id, now)
            })
            .await?;
        info!(task_id = %id, user_id = %actor.id(), "task confirmed");
        let recipients = self.recipients_except(&task, &[actor.id()]).await;
        self.notify(
            &task,
            recipients,
            Template::TaskConfirmed,
            context! { title => task.title(), actor => actor.display_name() },
        )
        .await;
        Ok(task)
    }

    /// Sends a submitted report back, discarding it, and notifies every
    /// responsible party.
    ///
    /// # Errors
    ///
    /// Returns a domain error unless the task is pending review, plus access
    /// and storage errors.
    pub async fn reject(&self, actor: &User, id: TaskId) -> TaskLifecycleResult<Task> {
        let actor_id = actor.id().clone();
        let now = self.clock.utc();
        let task = self
            .mutate(actor, id, AccessRequirement::Creator, move |task| {
                task.reject(&actor_id, now)
            })
            .await?;
        info!(task_id = %id, user_id = %actor.id(), "task sent back for rework");
        let recipients = self.recipients_except(&task, &[]).await;
        self.notify(
            &task,
            recipients,
            Template::TaskRejected,
            context! { title => task.title(), actor => actor.display_name() },
        )
        .await;
        Ok(task)
    }

    /// Reopens a completed task and notifies the responsible parties other
    /// than the creator.
    ///
    /// # Errors
    ///
    /// Returns a domain error unless the task is completed, plus access and
    /// storage errors.
    pub async fn reopen(&self, actor: &User, id: TaskId) -> TaskLifecycleResult<Task> {
        let actor_id = actor.id().clone();
        let now = self.clock.utc();
        let task = self
            .mutate(actor, id, AccessRequirement::Creator, move |task| {
                task.reopen(&actor_id, now)
            })
            .await?;
        info!(task_id = %id, user_id = %actor.id(), "task reopened");
        let recipients = self.recipients_except(&task, &[task.creator()]).await;
        self.notify(
            &task,
            recipients,
            Template::TaskReopened,
            context! { title => task.title(), actor => actor.display_name() },
        )
        .await;
        Ok(task)
    }

    /// Cancels a task and notifies the creator and responsible parties other
    /// than the actor.
    ///
    /// # Errors
    ///
    /// Returns a domain error for an already cancelled task, plus access and
    /// storage errors.
    pub async fn cancel(&self, actor: &User, id: TaskId) -> TaskLifecycleResult<Task> {
        let actor_id = actor.id().clone();
        let now = self.clock.utc();
        let task = self
            .mutate(actor, id, AccessRequirement::Creator, move |task| {
                task.cancel(&actor_id, now)
            })
            .await?;
        info!(task_id = %id, user_id = %actor.id(), "task cancelled");
        let mut recipients = self.recipients_except(&task, &[actor.id()]).await;
        if task.creator() != actor.id() && !recipients.contains(task.creator()) {
            recipients.push(task.creator().clone());
        }
        self.notify(
            &task,
            recipients,
            Template::TaskCancelled,
            context! { title => task.title(), actor => actor.display_name() },
        )
        .await;
        Ok(task)
    }

    /// Flips a subtask and recomputes progress.
    ///
    /// # Errors
    ///
    /// Returns a domain error for closed tasks or foreign subtasks, plus
    /// access and storage errors.
    pub async fn toggle_subtask(
        &self,
        actor: &User,
        id: TaskId,
        subtask_id: SubtaskId,
    ) -> TaskLifecycleResult<Task> {
        let actor_id = actor.id().clone();
        let now = self.clock.utc();
        self.mutate(actor, id, AccessRequirement::Participant, move |task| {
            task.toggle_subtask(subtask_id, &actor_id, now)
        })
        .await
    }

    /// Appends subtasks to an open task.
    ///
    /// # Errors
    ///
    /// Returns a domain error for closed tasks or blank titles, plus access
    /// and storage errors.
    pub async fn add_subtasks(
        &self,
        actor: &User,
        id: TaskId,
        titles: Vec<String>,
    ) -> TaskLifecycleResult<Task> {
        self.load_authorized(actor, id, AccessRequirement::Creator)
            .await?;
        let now = self.clock.utc();
        let task = self
            .repository
            .add_subtasks(id, titles, actor.id().clone(), now)
            .await?;
        info!(task_id = %id, user_id = %actor.id(), progress = ?task.progress(), "subtasks added");
        Ok(task)
    }

    /// Deletes a task with everything attached to it.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::AccessDenied`] when the delete policy
    /// refuses the caller, plus not-found and storage errors.
    pub async fn delete_task(&self, actor: &User, id: TaskId) -> TaskLifecycleResult<()> {
        self.load_authorized(actor, id, self.delete_policy.requirement())
            .await?;
        self.repository.delete(id).await?;
        self.due_reminders.cancel(id);
        info!(task_id = %id, user_id = %actor.id(), "task deleted");
        Ok(())
    }

    /// Posts a comment and notifies the creator and responsible parties
    /// other than the author.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyComment`] for blank text, plus access
    /// and storage errors.
    pub async fn add_comment(
        &self,
        actor: &User,
        id: TaskId,
        text: impl Into<String>,
    ) -> TaskLifecycleResult<TaskComment> {
        let task = self
            .load_authorized(actor, id, AccessRequirement::Participant)
            .await?;
        let now = self.clock.utc();
        let comment = NewComment::new(id, actor.id().clone(), text, now)?;
        let stored = self.repository.append_comment(comment).await?;
        info!(task_id = %id, user_id = %actor.id(), "comment added");
        let mut recipients = self.recipients_except(&task, &[actor.id()]).await;
        if task.creator() != actor.id() && !recipients.contains(task.creator()) {
            recipients.insert(0, task.creator().clone());
        }
        self.notify(
            &task,
            recipients,
            Template::CommentPosted,
            context! {
                title => task.title(),
                author => actor.display_name(),
                text => stored.text.as_str(),
            },
        )
        .await;
        Ok(stored)
    }

    /// Returns the history of a task the caller participates in.
    ///
    /// # Errors
    ///
    /// Returns not-found, access, and storage errors.
    pub async fn task_history(
        &self,
        actor: &User,
        id: TaskId,
    ) -> TaskLifecycleResult<Vec<TaskHistoryEntry>> {
        self.load_authorized(actor, id, AccessRequirement::Participant)
            .await?;
        Ok(self.repository.history(id).await?)
    }

    /// Returns the comments of a task the caller participates in.
    ///
    /// # Errors
    ///
    /// Returns not-found, access, and storage errors.
    pub async fn task_comments(
        &self,
        actor: &User,
        id: TaskId,
    ) -> TaskLifecycleResult<Vec<TaskComment>> {
        self.load_authorized(actor, id, AccessRequirement::Participant)
            .await?;
        Ok(self.repository.comments(id).await?)
    }

    /// Renames a task.
    ///
    /// # Errors
    ///
    /// Returns a domain error for closed tasks or blank titles, plus access
    /// and storage errors.
    pub async fn rename(
        &self,
        actor: &User,
        id: TaskId,
        title: impl Into<String>,
    ) -> TaskLifecycleResult<Task> {
        let actor_id = actor.id().clone();
        let now = self.clock.utc();
        let next: String = title.into();
        self.mutate(actor, id, AccessRequirement::Creator, move |task| {
            task.rename(next, &actor_id, now)
        })
        .await
    }

    /// Replaces the description; `None` or blank text clears it.
    ///
    /// # Errors
    ///
    /// Returns a domain error for closed tasks, plus access and storage
    /// errors.
    pub async fn update_description(
        &self,
        actor: &User,
        id: TaskId,
        description: Option<String>,
    ) -> TaskLifecycleResult<Task> {
        let actor_id = actor.id().clone();
        let now = self.clock.utc();
        self.mutate(actor, id, AccessRequirement::Creator, move |task| {
            task.set_description(description, &actor_id, now)
        })
        .await
    }

    /// Replaces the due date and reschedules the one-shot reminder.
    ///
    /// # Errors
    ///
    /// Returns a domain error for closed tasks, plus access and storage
    /// errors.
    pub async fn update_due_date(
        &self,
        actor: &User,
        id: TaskId,
        due_date: Option<DateTime<Utc>>,
    ) -> TaskLifecycleResult<Task> {
        let actor_id = actor.id().clone();
        let now = self.clock.utc();
        self.mutate(actor, id, AccessRequirement::Creator, move |task| {
            task.set_due_date(due_date, &actor_id, now)
        })
        .await
    }

    /// Replaces the reminder interval.
    ///
    /// # Errors
    ///
    /// Returns a domain error for closed tasks, plus access and storage
    /// errors.
    pub async fn update_interval(
        &self,
        actor: &User,
        id: TaskId,
        interval: Option<NotificationInterval>,
    ) -> TaskLifecycleResult<Task> {
        let actor_id = actor.id().clone();
        let now = self.clock.utc();
        self.mutate(actor, id, AccessRequirement::Creator, move |task| {
            task.set_notification_interval(interval, &actor_id, now)
        })
        .await
    }

    /// Hands the task to another user or role and notifies the new
    /// responsible parties other than the actor.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::UnknownUser`] or
    /// [`TaskLifecycleError::UnknownRole`] for a dangling target, plus
    /// domain, access, and storage errors.
    pub async fn reassign(
        &self,
        actor: &User,
        id: TaskId,
        assignment: Assignment,
    ) -> TaskLifecycleResult<Task> {
        self.ensure_assignment_target(&assignment).await?;
        let actor_id = actor.id().clone();
        let now = self.clock.utc();
        let task = self
            .mutate(actor, id, AccessRequirement::Creator, move |task| {
                task.reassign(assignment, &actor_id, now)
            })
            .await?;
        info!(task_id = %id, user_id = %actor.id(), assignment = %task.assignment(), "task reassigned");
        self.announce_assignment(&task, actor).await;
        Ok(task)
    }

    async fn load_authorized(
        &self,
        actor: &User,
        id: TaskId,
        requirement: AccessRequirement,
    ) -> TaskLifecycleResult<Task> {
        let task = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(TaskLifecycleError::TaskNotFound(id))?;
        AccessGuard::authorize(actor, &task, requirement)?;
        Ok(task)
    }

    async fn mutate<F>(
        &self,
        actor: &User,
        id: TaskId,
        requirement: AccessRequirement,
        mutation: F,
    ) -> TaskLifecycleResult<Task>
    where
        F: FnOnce(&mut Task) -> Result<HistoryRecord, TaskDomainError> + Send + 'static,
    {
        self.load_authorized(actor, id, requirement).await?;
        let updated = self
            .repository
            .modify(id, Box::new(move |task| mutation(task).map(|record| vec![record])))
            .await?;
        self.due_reminders.schedule(&updated, self.clock.utc());
        Ok(updated)
    }

    async fn ensure_assignment_target(&self, assignment: &Assignment) -> TaskLifecycleResult<()> {
        match assignment {
            Assignment::User(user) => {
                if self.directory.find_user(user).await?.is_none() {
                    return Err(TaskLifecycleError::UnknownUser(user.clone()));
                }
            }
            Assignment::Role(role) => {
                if self.directory.find_role(*role).await?.is_none() {
                    return Err(TaskLifecycleError::UnknownRole(*role));
                }
            }
        }
        Ok(())
    }

    async fn announce_assignment(&self, task: &Task, actor: &User) {
        let recipients = self.recipients_except(task, &[actor.id()]).await;
        self.notify(
            task,
            recipients,
            Template::TaskAssigned,
            context! {
                title => task.title(),
                creator => actor.display_name(),
                due => task.due_date().map(|due| due.format("%Y-%m-%d %H:%M UTC").to_string()),
                progress => task.progress().map(|progress| progress.to_string()),
            },
        )
        .await;
    }

    async fn recipients_except(&self, task: &Task, excluded: &[&UserId]) -> Vec<UserId> {
        self.resolver
            .responsible_except(task, excluded)
            .await
            .unwrap_or_else(|error| {
                warn!(task_id = %task.id(), %error, "could not resolve responsible parties");
                Vec::new()
            })
    }

    async fn notify(
        &self,
        task: &Task,
        recipients: Vec<UserId>,
        template: Template,
        context: Value,
    ) -> DeliveryReport {
        if recipients.is_empty() {
            return DeliveryReport::default();
        }
        match self.renderer.render(template, context) {
            Ok(message) => dispatch(self.notifier.as_ref(), recipients, &message).await,
            Err(error) => {
                warn!(task_id = %task.id(), %error, "notification not rendered");
                DeliveryReport::default()
            }
        }
    }
}
