//! Task creation wizard.
//!
//! The draft accumulates in the session payload until the assignee is
//! picked; only then is anything written to the task repository. A failed
//! commit keeps the session so the user can retry.

use super::command::Command;
use super::engine::{
    ConversationEngine, Replies, char_len, invalid, out_of_place, refusal,
};
use super::error::{EngineResult, InputError};
use super::event::InboundEvent;
use super::pickers::CalendarHost;
use super::views;
use crate::directory::domain::User;
use crate::directory::ports::UserDirectory;
use crate::notification::domain::{MessageKind, OutboundMessage};
use crate::notification::ports::Notifier;
use crate::session::domain::{CalendarReturn, CreationDraft, Session, SessionPayload, WizardStep};
use crate::session::ports::SessionStore;
use crate::task::domain::Assignment;
use crate::task::ports::TaskRepository;
use crate::task::services::CreateTaskRequest;
use mockable::Clock;
use tracing::{debug, info};

/// Step reached by "back" from `step`. `None` at the first step.
const fn previous_step(step: WizardStep) -> Option<WizardStep> {
    match step {
        WizardStep::TaskDescription => Some(WizardStep::TaskTitle),
        WizardStep::TaskSubtasks => Some(WizardStep::TaskDescription),
        WizardStep::TaskSubtaskInput | WizardStep::TaskAttachments => {
            Some(WizardStep::TaskSubtasks)
        }
        WizardStep::TaskAttachmentInput | WizardStep::CalendarDay => {
            Some(WizardStep::TaskAttachments)
        }
        WizardStep::CalendarTime | WizardStep::TaskNotificationInterval => {
            Some(WizardStep::CalendarDay)
        }
        WizardStep::TaskAssignee => Some(WizardStep::TaskNotificationInterval),
        WizardStep::TaskAssigneeUser | WizardStep::TaskAssigneeRole => {
            Some(WizardStep::TaskAssignee)
        }
        _ => None,
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
    pub(super) async fn creation_step(
        &self,
        user: &User,
        session: Session,
        draft: CreationDraft,
        event: &InboundEvent,
    ) -> EngineResult<Replies> {
        let step = session.step();
        match (step, event.command()) {
            (WizardStep::TaskCancelConfirm, Some(Command::CancelConfirm)) => {
                self.sessions.clear(user.id()).await?;
                info!(user_id = %user.id(), "task creation discarded");
                return Ok(vec![
                    views::notice(MessageKind::Info, "Task discarded."),
                    views::main_menu(user),
                ]);
            }
            (WizardStep::TaskCancelConfirm, Some(Command::CancelDecline | Command::Back)) => {
                return self.resume_creation(user, session, draft).await;
            }
            (WizardStep::TaskCancelConfirm, _) => {
                return Ok(vec![invalid(&InputError::ChoiceExpected), views::cancel_gate()]);
            }
            (_, Some(Command::Cancel)) => return self.request_cancel(user, session, draft).await,
            (_, Some(Command::Back)) => return self.creation_back(user, session, draft).await,
            _ => {}
        }
        match step {
            WizardStep::TaskTitle => self.creation_title(session, draft, event).await,
            WizardStep::TaskDescription => self.creation_description(session, draft, event).await,
            WizardStep::TaskSubtasks => self.subtask_menu(session, draft, event).await,
            WizardStep::TaskSubtaskInput => self.subtask_input(session, draft, event).await,
            WizardStep::TaskAttachments => self.attachment_menu(user, session, draft, event).await,
            WizardStep::TaskAttachmentInput => self.attachment_input(session, draft, event).await,
            WizardStep::CalendarDay | WizardStep::CalendarTime => {
                self.calendar_step(user, session, CalendarHost::Creation(draft), event)
                    .await
            }
            WizardStep::TaskNotificationInterval => {
                self.creation_interval(session, draft, event).await
            }
            WizardStep::TaskAssignee
            | WizardStep::TaskAssigneeUser
            | WizardStep::TaskAssigneeRole => {
                self.creation_assignee(user, session, draft, event).await
            }
            _ => {
                self.sessions.clear(user.id()).await?;
                Ok(vec![views::main_menu(user)])
            }
        }
    }

    /// Prompt of a creation step, as shown on entry.
    async fn creation_prompt(
        &self,
        user: &User,
        step: WizardStep,
        draft: &CreationDraft,
    ) -> EngineResult<OutboundMessage> {
        Ok(match step {
            WizardStep::TaskTitle => views::title_prompt(self.settings.title_min_chars),
            WizardStep::TaskDescription => {
                views::text_prompt("Add a description, or press Skip.", true)
            }
            WizardStep::TaskSubtasks => views::subtask_loop(draft),
            WizardStep::TaskSubtaskInput => views::text_prompt(
                "Send the subtask title. Each line becomes a separate subtask.",
                false,
            ),
            WizardStep::TaskAttachments => views::attachment_loop(&draft.attachments),
            WizardStep::TaskAttachmentInput => {
                views::text_prompt("Send the photo, document, video, or audio file.", false)
            }
            WizardStep::CalendarDay | WizardStep::CalendarTime => {
                let cursor = draft
                    .calendar
                    .unwrap_or_else(|| self.open_calendar(user, CalendarReturn::ResumeCreation));
                self.calendar_prompt(user, &cursor)
            }
            WizardStep::TaskNotificationInterval => {
                views::interval_menu(&self.settings.interval_choices_minutes)
            }
            WizardStep::TaskAssignee => views::assignee_menu(),
            WizardStep::TaskAssigneeUser => self.user_picker(draft.assignee_page).await?,
            WizardStep::TaskAssigneeRole => self.role_picker().await?,
            WizardStep::TaskCancelConfirm => views::cancel_gate(),
            _ => views::main_menu(user),
        })
    }

    async fn move_to(
        &self,
        user: &User,
        session: Session,
        step: WizardStep,
        draft: CreationDraft,
    ) -> EngineResult<Replies> {
        let prompt = self.creation_prompt(user, step, &draft).await?;
        self.advance(session, step, SessionPayload::Creation(draft))
            .await?;
        Ok(vec![prompt])
    }

    async fn request_cancel(
        &self,
        user: &User,
        session: Session,
        mut draft: CreationDraft,
    ) -> EngineResult<Replies> {
        if draft.title.is_none() {
            self.sessions.clear(user.id()).await?;
            return Ok(vec![
                views::notice(MessageKind::Info, "Task creation cancelled."),
                views::main_menu(user),
            ]);
        }
        draft.resume_step = Some(session.step());
        self.move_to(user, session, WizardStep::TaskCancelConfirm, draft)
            .await
    }

    async fn resume_creation(
        &self,
        user: &User,
        session: Session,
        mut draft: CreationDraft,
    ) -> EngineResult<Replies> {
        let step = draft.resume_step.take().unwrap_or(WizardStep::TaskTitle);
        debug!(user_id = %user.id(), step = %step, "task creation resumed");
        self.move_to(user, session, step, draft).await
    }

    async fn creation_back(
        &self,
        user: &User,
        session: Session,
        mut draft: CreationDraft,
    ) -> EngineResult<Replies> {
        let Some(previous) = previous_step(session.step()) else {
            return self.request_cancel(user, session, draft).await;
        };
        match previous {
            WizardStep::CalendarDay => {
                let mut cursor = draft
                    .calendar
                    .unwrap_or_else(|| self.open_calendar(user, CalendarReturn::ResumeCreation));
                cursor.selected_date = None;
                draft.calendar = Some(cursor);
            }
            WizardStep::TaskAttachments => draft.calendar = None,
            _ => {}
        }
        self.move_to(user, session, previous, draft).await
    }

    async fn creation_title(
        &self,
        session: Session,
        mut draft: CreationDraft,
        event: &InboundEvent,
    ) -> EngineResult<Replies> {
        let Some(text) = event.message_text() else {
            return Ok(vec![invalid(&InputError::TextExpected)]);
        };
        let min = self.settings.title_min_chars;
        if char_len(text) < min {
            return Ok(vec![invalid(&InputError::TitleTooShort { min })]);
        }
        draft.title = Some(text.to_owned());
        self.advance(session, WizardStep::TaskDescription, SessionPayload::Creation(draft))
            .await?;
        Ok(vec![views::text_prompt(
            "Add a description, or press Skip.",
            true,
        )])
    }

    async fn creation_description(
        &self,
        session: Session,
        mut draft: CreationDraft,
        event: &InboundEvent,
    ) -> EngineResult<Replies> {
        draft.description = match (event.command(), event.message_text()) {
            (Some(Command::Skip), _) => None,
            (None, Some(text)) if self.settings.is_skip_token(text) => None,
            (None, Some(text)) => Some(text.to_owned()),
            (None, None) => return Ok(vec![invalid(&InputError::TextExpected)]),
            (Some(_), _) => return Ok(vec![out_of_place()]),
        };
        let prompt = views::subtask_loop(&draft);
        self.advance(session, WizardStep::TaskSubtasks, SessionPayload::Creation(draft))
            .await?;
        Ok(vec![prompt])
    }

    async fn subtask_menu(
        &self,
        session: Session,
        mut draft: CreationDraft,
        event: &InboundEvent,
    ) -> EngineResult<Replies> {
        let Some(command) = event.command() else {
            return Ok(vec![invalid(&InputError::ChoiceExpected), views::subtask_loop(&draft)]);
        };
        let (step, prompt) = match command {
            Command::AddSubtask => (
                WizardStep::TaskSubtaskInput,
                views::text_prompt(
                    "Send the subtask title. Each line becomes a separate subtask.",
                    false,
                ),
            ),
            Command::ClearSubtasks => {
                draft.subtasks.clear();
                (WizardStep::TaskSubtasks, views::subtask_loop(&draft))
            }
            Command::Next => (
                WizardStep::TaskAttachments,
                views::attachment_loop(&draft.attachments),
            ),
            _ => return Ok(vec![out_of_place()]),
        };
        self.advance(session, step, SessionPayload::Creation(draft))
            .await?;
        Ok(vec![prompt])
    }

    async fn subtask_input(
        &self,
        session: Session,
        mut draft: CreationDraft,
        event: &InboundEvent,
    ) -> EngineResult<Replies> {
        let Some(text) = event.message_text() else {
            return Ok(vec![invalid(&InputError::TextExpected)]);
        };
        draft.subtasks.extend(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_owned),
        );
        let prompt = views::subtask_loop(&draft);
        self.advance(session, WizardStep::TaskSubtasks, SessionPayload::Creation(draft))
            .await?;
        Ok(vec![prompt])
    }

    async fn attachment_menu(
        &self,
        user: &User,
        session: Session,
        mut draft: CreationDraft,
        event: &InboundEvent,
    ) -> EngineResult<Replies> {
        let Some(command) = event.command() else {
            return Ok(vec![
                invalid(&InputError::ChoiceExpected),
                views::attachment_loop(&draft.attachments),
            ]);
        };
        match command {
            Command::AddAttachment => {
                self.move_to(user, session, WizardStep::TaskAttachmentInput, draft)
                    .await
            }
            Command::ClearAttachments => {
                draft.attachments.clear();
                self.move_to(user, session, WizardStep::TaskAttachments, draft)
                    .await
            }
            Command::Next => {
                draft.calendar = Some(self.open_calendar(user, CalendarReturn::ResumeCreation));
                self.move_to(user, session, WizardStep::CalendarDay, draft)
                    .await
            }
            _ => Ok(vec![out_of_place()]),
        }
    }

    async fn attachment_input(
        &self,
        session: Session,
        mut draft: CreationDraft,
        event: &InboundEvent,
    ) -> EngineResult<Replies> {
        let Some(media) = event.message_media() else {
            return Ok(vec![invalid(&InputError::MediaExpected)]);
        };
        draft.attachments.push(media.clone());
        let prompt = views::attachment_loop(&draft.attachments);
        self.advance(session, WizardStep::TaskAttachments, SessionPayload::Creation(draft))
            .await?;
        Ok(vec![prompt])
    }

    async fn creation_interval(
        &self,
        session: Session,
        mut draft: CreationDraft,
        event: &InboundEvent,
    ) -> EngineResult<Replies> {
        draft.notification_interval = match event.command() {
            Some(Command::Interval(interval)) => match self.offered_interval(*interval) {
                Ok(offered) => Some(offered),
                Err(err) => return Ok(vec![invalid(&err)]),
            },
            Some(Command::NoInterval | Command::Skip) => None,
            Some(_) => return Ok(vec![out_of_place()]),
            None => return Ok(vec![invalid(&InputError::ChoiceExpected)]),
        };
        self.advance(session, WizardStep::TaskAssignee, SessionPayload::Creation(draft))
            .await?;
        Ok(vec![views::assignee_menu()])
    }

    async fn creation_assignee(
        &self,
        user: &User,
        session: Session,
        mut draft: CreationDraft,
        event: &InboundEvent,
    ) -> EngineResult<Replies> {
        let Some(command) = event.command() else {
            return Ok(vec![invalid(&InputError::ChoiceExpected)]);
        };
        match (session.step(), command) {
            (WizardStep::TaskAssignee, Command::AssignSelf) => {
                self.commit(user, draft, Assignment::User(user.id().clone()))
                    .await
            }
            (WizardStep::TaskAssignee, Command::AssignUserMenu) => {
                draft.assignee_page = 0;
                self.move_to(user, session, WizardStep::TaskAssigneeUser, draft)
                    .await
            }
            (WizardStep::TaskAssignee, Command::AssignRoleMenu) => {
                self.move_to(user, session, WizardStep::TaskAssigneeRole, draft)
                    .await
            }
            (WizardStep::TaskAssigneeUser, Command::AssigneePage(page)) => {
                draft.assignee_page = *page;
                self.move_to(user, session, WizardStep::TaskAssigneeUser, draft)
                    .await
            }
            (WizardStep::TaskAssigneeUser, Command::AssignUser(assignee)) => {
                self.commit(user, draft, Assignment::User(assignee.clone()))
                    .await
            }
            (WizardStep::TaskAssigneeRole, Command::AssignRole(role)) => {
                self.commit(user, draft, Assignment::Role(*role)).await
            }
            _ => Ok(vec![out_of_place()]),
        }
    }

    async fn commit(
        &self,
        user: &User,
        draft: CreationDraft,
        assignment: Assignment,
    ) -> EngineResult<Replies> {
        let Some(title) = draft.title else {
            return Ok(vec![invalid(&InputError::TitleTooShort {
                min: self.settings.title_min_chars,
            })]);
        };
        let request = CreateTaskRequest::new(title, assignment)
            .with_description(draft.description)
            .with_subtasks(draft.subtasks)
            .with_attachments(draft.attachments)
            .with_due_date(draft.due_date)
            .with_notification_interval(draft.notification_interval);
        match self.lifecycle.create_task(user, request).await {
            Ok(task) => {
                self.sessions.clear(user.id()).await?;
                Ok(vec![
                    views::notice(MessageKind::Info, "Task created."),
                    self.card(user, &task).await?,
                ])
            }
            Err(err) => Ok(vec![refusal(err)?]),
        }
    }
}
