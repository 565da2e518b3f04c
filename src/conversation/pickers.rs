//! Steps shared by the creation and edit wizards.
//!
//! The calendar sub-machine stores its return address in the cursor, so the
//! picked instant goes back to the draft or to the persisted task without
//! the button payload saying which.

use super::calendar::{self, CalendarError};
use super::command::Command;
use super::engine::{ConversationEngine, Replies, ends_wizard, invalid, out_of_place, refusal};
use super::error::{EngineResult, InputError};
use super::event::InboundEvent;
use super::views;
use crate::directory::domain::User;
use crate::directory::ports::UserDirectory;
use crate::notification::domain::{MessageKind, OutboundMessage};
use crate::notification::ports::Notifier;
use crate::session::domain::{
    CalendarCursor, CalendarReturn, CreationDraft, EditSession, Session, SessionPayload,
    WizardStep,
};
use crate::session::ports::SessionStore;
use crate::task::domain::{NotificationInterval, Task};
use crate::task::ports::TaskRepository;
use crate::task::services::TaskLifecycleResult;
use chrono::{DateTime, NaiveTime, Utc};
use mockable::Clock;

/// Wizard that opened the calendar.
pub(super) enum CalendarHost {
    Creation(CreationDraft),
    Edit(EditSession),
}

impl CalendarHost {
    const fn return_address(&self) -> CalendarReturn {
        match self {
            Self::Creation(_) => CalendarReturn::ResumeCreation,
            Self::Edit(edit) => CalendarReturn::ResumeEdit(edit.task_id),
        }
    }

    const fn cursor(&self) -> Option<CalendarCursor> {
        match self {
            Self::Creation(draft) => draft.calendar,
            Self::Edit(edit) => edit.calendar,
        }
    }

    fn with_cursor(self, cursor: Option<CalendarCursor>) -> SessionPayload {
        match self {
            Self::Creation(mut draft) => {
                draft.calendar = cursor;
                SessionPayload::Creation(draft)
            }
            Self::Edit(mut edit) => {
                edit.calendar = cursor;
                SessionPayload::Edit(edit)
            }
        }
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
    /// Calendar screen for `cursor`: the month grid, or the time menu once a
    /// day is picked.
    pub(super) fn calendar_prompt(&self, user: &User, cursor: &CalendarCursor) -> OutboundMessage {
        let now = self.clock.utc();
        let today = user.local_date(now);
        if let Some(day) = cursor.selected_date {
            let slots = calendar::available_slots(
                &self.slots,
                day,
                user.local_time(now).naive_local(),
            );
            return views::time_view(day, &slots);
        }
        let weeks = cursor
            .first_of_month()
            .map(calendar::month_grid)
            .unwrap_or_default();
        views::calendar_view(cursor, &weeks, today)
    }

    /// Cursor on the viewer's current month.
    pub(super) fn open_calendar(&self, user: &User, return_to: CalendarReturn) -> CalendarCursor {
        CalendarCursor::open(user.local_date(self.clock.utc()), return_to)
    }

    pub(super) async fn calendar_step(
        &self,
        user: &User,
        session: Session,
        host: CalendarHost,
        event: &InboundEvent,
    ) -> EngineResult<Replies> {
        let Some(cursor) = host.cursor() else {
            let reopened = self.open_calendar(user, host.return_address());
            self.advance(session, WizardStep::CalendarDay, host.with_cursor(Some(reopened)))
                .await?;
            return Ok(vec![self.calendar_prompt(user, &reopened)]);
        };
        let Some(command) = event.command() else {
            return Ok(vec![
                invalid(&InputError::ChoiceExpected),
                self.calendar_prompt(user, &cursor),
            ]);
        };
        match (session.step(), command) {
            (_, Command::CalendarNoDate) => {
                self.deliver_due_date(user, session, host, cursor, None)
                    .await
            }
            (WizardStep::CalendarDay, Command::CalendarPrev | Command::CalendarNext) => {
                let forward = *command == Command::CalendarNext;
                let moved = cursor.shifted(forward).unwrap_or(cursor);
                self.advance(session, WizardStep::CalendarDay, host.with_cursor(Some(moved)))
                    .await?;
                Ok(vec![self.calendar_prompt(user, &moved)])
            }
            (WizardStep::CalendarDay, Command::CalendarDay(day)) => {
                let today = user.local_date(self.clock.utc());
                if let Err(err) = calendar::check_day(*day, today) {
                    return Ok(vec![invalid(&InputError::from(err))]);
                }
                let picked = CalendarCursor {
                    selected_date: Some(*day),
                    ..cursor
                };
                self.advance(session, WizardStep::CalendarTime, host.with_cursor(Some(picked)))
                    .await?;
                Ok(vec![self.calendar_prompt(user, &picked)])
            }
            (WizardStep::CalendarTime, Command::CalendarTime(_) | Command::CalendarNoTime) => {
                let time = match command {
                    Command::CalendarTime(slot) => Some(*slot),
                    _ => None,
                };
                match self.resolve_pick(user, &cursor, time) {
                    Ok(instant) => {
                        self.deliver_due_date(user, session, host, cursor, Some(instant))
                            .await
                    }
                    Err(err) => Ok(vec![invalid(&InputError::from(err))]),
                }
            }
            _ => Ok(vec![out_of_place()]),
        }
    }

    fn resolve_pick(
        &self,
        user: &User,
        cursor: &CalendarCursor,
        time: Option<NaiveTime>,
    ) -> Result<DateTime<Utc>, CalendarError> {
        let now = self.clock.utc();
        let day = cursor
            .selected_date
            .ok_or(CalendarError::PastInstant)?;
        if let Some(slot) = time {
            calendar::check_slot(slot, &self.slots)?;
        }
        calendar::resolve_instant(day, time, user.timezone().tz(), now)
    }

    async fn deliver_due_date(
        &self,
        user: &User,
        session: Session,
        host: CalendarHost,
        cursor: CalendarCursor,
        due: Option<DateTime<Utc>>,
    ) -> EngineResult<Replies> {
        match (cursor.return_to, host) {
            (CalendarReturn::ResumeCreation, CalendarHost::Creation(mut draft)) => {
                draft.due_date = due;
                draft.calendar = None;
                self.advance(
                    session,
                    WizardStep::TaskNotificationInterval,
                    SessionPayload::Creation(draft),
                )
                .await?;
                Ok(vec![views::interval_menu(&self.settings.interval_choices_minutes)])
            }
            (CalendarReturn::ResumeEdit(task_id), CalendarHost::Edit(_)) => {
                let result = self.lifecycle.update_due_date(user, task_id, due).await;
                self.finish_edit(user, result, "Due date updated.").await
            }
            (_, stale) => {
                // The cursor disagrees with the wizard; start the calendar over.
                let reopened = self.open_calendar(user, stale.return_address());
                self.advance(session, WizardStep::CalendarDay, stale.with_cursor(Some(reopened)))
                    .await?;
                Ok(vec![self.calendar_prompt(user, &reopened)])
            }
        }
    }

    /// Clears the wizard after a successful edit, or keeps it for a refusal
    /// the user can correct.
    pub(super) async fn finish_edit(
        &self,
        user: &User,
        result: TaskLifecycleResult<Task>,
        confirmation: &str,
    ) -> EngineResult<Replies> {
        match result {
            Ok(task) => {
                self.sessions.clear(user.id()).await?;
                Ok(vec![
                    views::notice(MessageKind::Info, confirmation),
                    self.card(user, &task).await?,
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

    /// Interval from the menu, refusing values that are not offered.
    pub(super) fn offered_interval(
        &self,
        interval: NotificationInterval,
    ) -> Result<NotificationInterval, InputError> {
        if self
            .settings
            .interval_choices_minutes
            .contains(&interval.minutes())
        {
            Ok(interval)
        } else {
            Err(InputError::UnknownInterval(interval.minutes()))
        }
    }

    /// Page of the user picker.
    pub(super) async fn user_picker(&self, page: usize) -> EngineResult<OutboundMessage> {
        let users = self.directory.list_users().await?;
        Ok(views::user_picker(
            &users,
            page,
            self.settings.assignee_page_size,
        ))
    }

    /// Role picker.
    pub(super) async fn role_picker(&self) -> EngineResult<OutboundMessage> {
        let roles = self.directory.list_roles().await?;
        Ok(views::role_picker(&roles))
    }
}
