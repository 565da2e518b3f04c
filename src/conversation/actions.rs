//! Buttons pressed outside any wizard, plus the short report and comment
//! flows they open.

use super::command::Command;
use super::engine::{ConversationEngine, Replies, ends_wizard, invalid, refusal};
use super::error::{EngineResult, InputError};
use super::event::InboundEvent;
use super::views;
use crate::directory::domain::User;
use crate::directory::ports::UserDirectory;
use crate::notification::domain::{MessageKind, OutboundMessage};
use crate::notification::ports::Notifier;
use crate::session::domain::{Session, SessionPayload, WizardStep};
use crate::session::ports::SessionStore;
use crate::task::domain::{BlobRef, SubtaskId, TaskId, TaskReport, TaskStatus};
use crate::task::ports::TaskRepository;
use crate::task::services::{AccessGuard, TaskLifecycleError};
use mockable::Clock;
use tracing::{debug, info};

impl<R, D, N, S, C> ConversationEngine<R, D, N, S, C>
where
    R: TaskRepository,
    D: UserDirectory,
    N: Notifier,
    S: SessionStore,
    C: Clock + Send + Sync,
{
    pub(super) async fn act(&self, user: &User, command: &Command) -> EngineResult<Replies> {
        match command {
            Command::ViewTask(id) => Ok(vec![self.view(user, *id).await?]),
            Command::CompleteTask(id) => self.complete(user, *id).await,
            Command::ConfirmTask(id) => {
                let result = self.lifecycle.confirm(user, *id).await;
                self.outcome(user, result, "Task confirmed.").await
            }
            Command::RejectTask(id) => {
                let result = self.lifecycle.reject(user, *id).await;
                self.outcome(user, result, "Task sent back to work.").await
            }
            Command::ReopenTask(id) => {
                let result = self.lifecycle.reopen(user, *id).await;
                self.outcome(user, result, "Task reopened.").await
            }
            Command::CancelTask(id) => {
                let result = self.lifecycle.cancel(user, *id).await;
                self.outcome(user, result, "Task cancelled.").await
            }
            Command::DeleteTask(id) => self.delete_gate(user, *id).await,
            Command::ConfirmDelete(id) => self.delete(user, *id).await,
            Command::ToggleSubtask(id, subtask) => self.toggle(user, *id, *subtask).await,
            Command::ShowSubtasks(id) => match self.lifecycle.view_task(user, *id).await {
                Ok(task) => Ok(vec![views::subtask_checklist(&task)]),
                Err(err) => Ok(vec![refusal(err)?]),
            },
            Command::CommentTask(id) => self.start_comment(user, *id).await,
            Command::ShowComments(id) => self.comments(user, *id).await,
            Command::ShowHistory(id) => self.history(user, *id).await,
            Command::EditTask(id) => match self.editable_task(user, *id).await {
                Ok(task) => Ok(vec![views::edit_menu(&task)]),
                Err(err) => Ok(vec![refusal(err)?]),
            },
            Command::EditField(id, field) => self.start_edit(user, *id, *field).await,
            Command::EditProfile(field) => self.start_profile_edit(user, *field).await,
            Command::TutorialDone => self.tutorial_done(user).await,
            Command::Noop => Ok(Vec::new()),
            stale => {
                debug!(user_id = %user.id(), command = %stale, "button pressed outside its wizard");
                Ok(vec![
                    views::notice(MessageKind::Info, "This button is no longer active."),
                    views::main_menu(user),
                ])
            }
        }
    }

    /// "Done" on a task card. The creator closes the task outright; anyone
    /// else is walked through a review report.
    async fn complete(&self, user: &User, id: TaskId) -> EngineResult<Replies> {
        let task = match self.lifecycle.view_task(user, id).await {
            Ok(task) => task,
            Err(err) => return Ok(vec![refusal(err)?]),
        };
        if task.creator() == user.id() {
            let result = self.lifecycle.complete_or_submit(user, id, None).await;
            return self.outcome(user, result, "Task completed.").await;
        }
        if task.status() != TaskStatus::Active {
            return Ok(vec![views::notice(
                MessageKind::ValidationError,
                format!("⚠ The task is {} and cannot be submitted.", task.status()),
            )]);
        }
        self.start(
            user.id(),
            WizardStep::TaskReport,
            SessionPayload::Report {
                task_id: id,
                attachments: Vec::new(),
            },
        )
        .await?;
        Ok(vec![views::report_prompt(&task, 0, TaskReport::MIN_TEXT_CHARS)])
    }

    async fn delete_gate(&self, user: &User, id: TaskId) -> EngineResult<Replies> {
        let task = match self.lifecycle.view_task(user, id).await {
            Ok(task) => task,
            Err(err) => return Ok(vec![refusal(err)?]),
        };
        let requirement = self.settings.delete_policy.requirement();
        if let Err(denied) = AccessGuard::authorize(user, &task, requirement) {
            return Ok(vec![refusal(TaskLifecycleError::AccessDenied(denied))?]);
        }
        Ok(vec![views::delete_gate(&task)])
    }

    async fn delete(&self, user: &User, id: TaskId) -> EngineResult<Replies> {
        match self.lifecycle.delete_task(user, id).await {
            Ok(()) => Ok(vec![
                views::notice(MessageKind::Info, "Task deleted."),
                views::main_menu(user),
            ]),
            Err(err) => Ok(vec![refusal(err)?]),
        }
    }

    async fn toggle(&self, user: &User, id: TaskId, subtask: SubtaskId) -> EngineResult<Replies> {
        match self.lifecycle.toggle_subtask(user, id, subtask).await {
            Ok(task) => Ok(vec![views::subtask_checklist(&task)]),
            Err(err) => Ok(vec![refusal(err)?]),
        }
    }

    async fn start_comment(&self, user: &User, id: TaskId) -> EngineResult<Replies> {
        if let Err(err) = self.lifecycle.view_task(user, id).await {
            return Ok(vec![refusal(err)?]);
        }
        self.start(
            user.id(),
            WizardStep::TaskComment,
            SessionPayload::Comment { task_id: id },
        )
        .await?;
        Ok(vec![views::text_prompt("Send your comment.", false)])
    }

    async fn comments(&self, user: &User, id: TaskId) -> EngineResult<Replies> {
        let task = match self.lifecycle.view_task(user, id).await {
            Ok(task) => task,
            Err(err) => return Ok(vec![refusal(err)?]),
        };
        match self.lifecycle.task_comments(user, id).await {
            Ok(comments) => Ok(vec![views::comments_view(
                &task,
                &comments,
                user.timezone().tz(),
            )]),
            Err(err) => Ok(vec![refusal(err)?]),
        }
    }

    async fn history(&self, user: &User, id: TaskId) -> EngineResult<Replies> {
        let task = match self.lifecycle.view_task(user, id).await {
            Ok(task) => task,
            Err(err) => return Ok(vec![refusal(err)?]),
        };
        match self.lifecycle.task_history(user, id).await {
            Ok(entries) => Ok(vec![views::history_view(
                &task,
                &entries,
                user.timezone().tz(),
            )]),
            Err(err) => Ok(vec![refusal(err)?]),
        }
    }

    pub(super) async fn comment_step(
        &self,
        user: &User,
        task_id: TaskId,
        event: &InboundEvent,
    ) -> EngineResult<Replies> {
        if matches!(event.command(), Some(Command::Cancel | Command::Back)) {
            self.sessions.clear(user.id()).await?;
            return Ok(vec![self.view(user, task_id).await?]);
        }
        let Some(text) = event.message_text() else {
            return Ok(vec![invalid(&InputError::TextExpected)]);
        };
        match self.lifecycle.add_comment(user, task_id, text).await {
            Ok(_) => {
                self.sessions.clear(user.id()).await?;
                Ok(vec![
                    views::notice(MessageKind::Info, "Comment posted."),
                    self.view(user, task_id).await?,
                ])
            }
            Err(err) => {
                if ends_wizard(&err) {
                    self.sessions.clear(user.id()).await?;
                }
                Ok(vec![refusal(err)?])
            }
        }
    }

    pub(super) async fn report_step(
        &self,
        user: &User,
        session: Session,
        task_id: TaskId,
        mut attachments: Vec<BlobRef>,
        event: &InboundEvent,
    ) -> EngineResult<Replies> {
        match event.command() {
            Some(Command::Cancel | Command::Back) => {
                self.sessions.clear(user.id()).await?;
                return Ok(vec![self.view(user, task_id).await?]);
            }
            Some(Command::SendReport) => {
                return self.submit_report(user, task_id, None, attachments).await;
            }
            Some(_) => return Ok(vec![report_hint()]),
            None => {}
        }
        let text = event.message_text().map(str::to_owned);
        let Some(media) = event.message_media() else {
            return self.submit_report(user, task_id, text, attachments).await;
        };
        attachments.push(media.clone());
        if text.is_some() {
            return self.submit_report(user, task_id, text, attachments).await;
        }
        let count = attachments.len();
        self.advance(
            session,
            WizardStep::TaskReport,
            SessionPayload::Report {
                task_id,
                attachments,
            },
        )
        .await?;
        Ok(vec![
            OutboundMessage::new(MessageKind::Info, format!("Attachment added ({count})."))
                .with_button(views::button("📨 Send report", &Command::SendReport))
                .with_button(views::button("✖ Cancel", &Command::Cancel)),
        ])
    }

    async fn submit_report(
        &self,
        user: &User,
        task_id: TaskId,
        text: Option<String>,
        attachments: Vec<BlobRef>,
    ) -> EngineResult<Replies> {
        let report = match TaskReport::new(text, attachments) {
            Ok(report) => report,
            Err(err) => {
                return Ok(vec![views::notice(
                    MessageKind::ValidationError,
                    format!("⚠ {err}"),
                )]);
            }
        };
        let result = self.lifecycle.submit_for_review(user, task_id, report).await;
        if result.is_ok() {
            info!(user_id = %user.id(), task_id = %task_id, "report submitted");
        }
        self.finish_edit(user, result, "Report sent for review.")
            .await
    }
}

fn report_hint() -> OutboundMessage {
    views::notice(
        MessageKind::Info,
        "Send the report text or a file, or press Cancel.",
    )
}
