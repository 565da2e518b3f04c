//! Edit wizard for persisted tasks.
//!
//! Unlike creation, every edit is applied with a single lifecycle call as
//! soon as the value is known, so the session only remembers which field is
//! being edited.

use super::command::Command;
use super::engine::{ConversationEngine, Replies, char_len, invalid, out_of_place, refusal};
use super::error::{EngineResult, InputError};
use super::event::InboundEvent;
use super::pickers::CalendarHost;
use super::views;
use crate::directory::domain::User;
use crate::directory::ports::UserDirectory;
use crate::notification::domain::OutboundMessage;
use crate::notification::ports::Notifier;
use crate::session::domain::{CalendarReturn, EditField, EditSession, Session, SessionPayload, WizardStep};
use crate::session::ports::SessionStore;
use crate::task::domain::{Assignment, Task, TaskId};
use crate::task::ports::TaskRepository;
use crate::task::services::{AccessGuard, AccessRequirement, TaskLifecycleResult};
use mockable::Clock;
use tracing::info;

const fn entry_step(field: EditField) -> WizardStep {
    match field {
        EditField::Title => WizardStep::EditTitle,
        EditField::Description => WizardStep::EditDescription,
        EditField::DueDate => WizardStep::CalendarDay,
        EditField::Interval => WizardStep::EditInterval,
        EditField::Assignee => WizardStep::EditAssignee,
        EditField::Subtasks => WizardStep::EditAddSubtasks,
    }
}

impl<R, D, N, S, C> ConversationEngine<R, D, N, S, C>
where
    R: TaskRepository,
    D: UserDirectory,
    N: Notifier,
    S: SessionStore,
    C: Clock + Send + Sync,
{
    /// Loads a task the user may edit right now.
    pub(super) async fn editable_task(&self, user: &User, id: TaskId) -> TaskLifecycleResult<Task> {
        let task = self.lifecycle.view_task(user, id).await?;
        AccessGuard::authorize(user, &task, AccessRequirement::Creator)?;
        task.ensure_editable()?;
        Ok(task)
    }

    pub(super) async fn start_edit(
        &self,
        user: &User,
        task_id: TaskId,
        field: EditField,
    ) -> EngineResult<Replies> {
        if let Err(err) = self.editable_task(user, task_id).await {
            return Ok(vec![refusal(err)?]);
        }
        let mut edit = EditSession::new(task_id, field);
        let step = entry_step(field);
        if field == EditField::DueDate {
            edit.calendar = Some(self.open_calendar(user, CalendarReturn::ResumeEdit(task_id)));
        }
        let prompt = self.edit_prompt(user, step, &edit).await?;
        self.start(user.id(), step, SessionPayload::Edit(edit)).await?;
        info!(user_id = %user.id(), task_id = %task_id, field = %field, "task edit started");
        Ok(vec![prompt])
    }

    async fn edit_prompt(
        &self,
        user: &User,
        step: WizardStep,
        edit: &EditSession,
    ) -> EngineResult<OutboundMessage> {
        Ok(match step {
            WizardStep::EditTitle => views::text_prompt(
                format!(
                    "Send the new title, at least {} characters.",
                    self.settings.title_min_chars
                ),
                false,
            ),
            WizardStep::EditDescription => views::text_prompt(
                "Send the new description, or press Skip to remove it.",
                true,
            ),
            WizardStep::EditInterval => views::interval_menu(&self.settings.interval_choices_minutes),
            WizardStep::EditAssignee => views::assignee_menu(),
            WizardStep::EditAssigneeUser => self.user_picker(edit.assignee_page).await?,
            WizardStep::EditAssigneeRole => self.role_picker().await?,
            WizardStep::EditAddSubtasks => views::text_prompt(
                "Send the subtasks to add, one per line.",
                false,
            ),
            _ => {
                let cursor = edit.calendar.unwrap_or_else(|| {
                    self.open_calendar(user, CalendarReturn::ResumeEdit(edit.task_id))
                });
                self.calendar_prompt(user, &cursor)
            }
        })
    }

    pub(super) async fn edit_step(
        &self,
        user: &User,
        session: Session,
        edit: EditSession,
        event: &InboundEvent,
    ) -> EngineResult<Replies> {
        let step = session.step();
        match event.command() {
            Some(Command::Cancel) => return self.abandon_edit(user, edit.task_id).await,
            Some(Command::Back) => return self.edit_back(user, session, edit).await,
            _ => {}
        }
        match step {
            WizardStep::CalendarDay | WizardStep::CalendarTime => {
                self.calendar_step(user, session, CalendarHost::Edit(edit), event)
                    .await
            }
            WizardStep::EditTitle => self.edit_title(user, &edit, event).await,
            WizardStep::EditDescription => self.edit_description(user, &edit, event).await,
            WizardStep::EditInterval => self.edit_interval(user, &edit, event).await,
            WizardStep::EditAssignee
            | WizardStep::EditAssigneeUser
            | WizardStep::EditAssigneeRole => self.edit_assignee(user, session, edit, event).await,
            WizardStep::EditAddSubtasks => self.edit_subtasks(user, &edit, event).await,
            _ => self.abandon_edit(user, edit.task_id).await,
        }
    }

    async fn abandon_edit(&self, user: &User, task_id: TaskId) -> EngineResult<Replies> {
        self.sessions.clear(user.id()).await?;
        Ok(vec![self.view(user, task_id).await?])
    }

    async fn edit_back(
        &self,
        user: &User,
        session: Session,
        mut edit: EditSession,
    ) -> EngineResult<Replies> {
        let previous = match session.step() {
            WizardStep::EditAssigneeUser | WizardStep::EditAssigneeRole => WizardStep::EditAssignee,
            WizardStep::CalendarTime => {
                if let Some(cursor) = edit.calendar.as_mut() {
                    cursor.selected_date = None;
                }
                WizardStep::CalendarDay
            }
            _ => return self.abandon_edit(user, edit.task_id).await,
        };
        let prompt = self.edit_prompt(user, previous, &edit).await?;
        self.advance(session, previous, SessionPayload::Edit(edit))
            .await?;
        Ok(vec![prompt])
    }

    async fn edit_title(
        &self,
        user: &User,
        edit: &EditSession,
        event: &InboundEvent,
    ) -> EngineResult<Replies> {
        let Some(text) = event.message_text() else {
            return Ok(vec![invalid(&InputError::TextExpected)]);
        };
        let min = self.settings.title_min_chars;
        if char_len(text) < min {
            return Ok(vec![invalid(&InputError::TitleTooShort { min })]);
        }
        let result = self.lifecycle.rename(user, edit.task_id, text).await;
        self.finish_edit(user, result, "Title updated.").await
    }

    async fn edit_description(
        &self,
        user: &User,
        edit: &EditSession,
        event: &InboundEvent,
    ) -> EngineResult<Replies> {
        let description = match (event.command(), event.message_text()) {
            (Some(Command::Skip), _) => None,
            (None, Some(text)) if self.settings.is_skip_token(text) => None,
            (None, Some(text)) => Some(text.to_owned()),
            (None, None) => return Ok(vec![invalid(&InputError::TextExpected)]),
            (Some(_), _) => return Ok(vec![out_of_place()]),
        };
        let result = self
            .lifecycle
            .update_description(user, edit.task_id, description)
            .await;
        self.finish_edit(user, result, "Description updated.").await
    }

    async fn edit_interval(
        &self,
        user: &User,
        edit: &EditSession,
        event: &InboundEvent,
    ) -> EngineResult<Replies> {
        let interval = match event.command() {
            Some(Command::Interval(interval)) => match self.offered_interval(*interval) {
                Ok(offered) => Some(offered),
                Err(err) => return Ok(vec![invalid(&err)]),
            },
            Some(Command::NoInterval | Command::Skip) => None,
            Some(_) => return Ok(vec![out_of_place()]),
            None => return Ok(vec![invalid(&InputError::ChoiceExpected)]),
        };
        let result = self
            .lifecycle
            .update_interval(user, edit.task_id, interval)
            .await;
        self.finish_edit(user, result, "Reminder interval updated.")
            .await
    }

    async fn edit_assignee(
        &self,
        user: &User,
        session: Session,
        mut edit: EditSession,
        event: &InboundEvent,
    ) -> EngineResult<Replies> {
        let Some(command) = event.command() else {
            return Ok(vec![invalid(&InputError::ChoiceExpected)]);
        };
        let next = match (session.step(), command) {
            (WizardStep::EditAssignee, Command::AssignSelf) => {
                return self
                    .apply_reassign(user, &edit, Assignment::User(user.id().clone()))
                    .await;
            }
            (WizardStep::EditAssigneeUser, Command::AssignUser(assignee)) => {
                return self
                    .apply_reassign(user, &edit, Assignment::User(assignee.clone()))
                    .await;
            }
            (WizardStep::EditAssigneeRole, Command::AssignRole(role)) => {
                return self
                    .apply_reassign(user, &edit, Assignment::Role(*role))
                    .await;
            }
            (WizardStep::EditAssignee, Command::AssignUserMenu) => {
                edit.assignee_page = 0;
                WizardStep::EditAssigneeUser
            }
            (WizardStep::EditAssignee, Command::AssignRoleMenu) => WizardStep::EditAssigneeRole,
            (WizardStep::EditAssigneeUser, Command::AssigneePage(page)) => {
                edit.assignee_page = *page;
                WizardStep::EditAssigneeUser
            }
            _ => return Ok(vec![out_of_place()]),
        };
        let prompt = self.edit_prompt(user, next, &edit).await?;
        self.advance(session, next, SessionPayload::Edit(edit))
            .await?;
        Ok(vec![prompt])
    }

    async fn apply_reassign(
        &self,
        user: &User,
        edit: &EditSession,
        assignment: Assignment,
    ) -> EngineResult<Replies> {
        let result = self.lifecycle.reassign(user, edit.task_id, assignment).await;
        self.finish_edit(user, result, "Assignee updated.").await
    }

    async fn edit_subtasks(
        &self,
        user: &User,
        edit: &EditSession,
        event: &InboundEvent,
    ) -> EngineResult<Replies> {
        let Some(text) = event.message_text() else {
            return Ok(vec![invalid(&InputError::TextExpected)]);
        };
        let titles: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect();
        if titles.is_empty() {
            return Ok(vec![invalid(&InputError::TextExpected)]);
        }
        let result = self.lifecycle.add_subtasks(user, edit.task_id, titles).await;
        self.finish_edit(user, result, "Subtasks added.").await
    }
}

