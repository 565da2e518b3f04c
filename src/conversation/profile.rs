//! Registration and profile editing.

use super::command::{Command, ProfileField};
use super::engine::{ConversationEngine, Replies, char_len, invalid};
use super::error::{EngineResult, InputError};
use super::event::InboundEvent;
use super::views;
use crate::directory::domain::{Timezone, User, UserId, WorkHours};
use crate::directory::ports::UserDirectory;
use crate::notification::domain::{MessageKind, OutboundMessage};
use crate::notification::ports::Notifier;
use crate::session::domain::{Session, SessionPayload, WizardStep};
use crate::session::ports::SessionStore;
use crate::task::ports::TaskRepository;
use mockable::Clock;
use tracing::info;

const fn profile_step_of(field: ProfileField) -> WizardStep {
    match field {
        ProfileField::FirstName => WizardStep::ProfileFirstName,
        ProfileField::LastName => WizardStep::ProfileLastName,
        ProfileField::WorkHours => WizardStep::ProfileWorkHours,
        ProfileField::Timezone => WizardStep::ProfileTimezone,
    }
}

fn profile_prompt(field: ProfileField) -> OutboundMessage {
    let text = match field {
        ProfileField::FirstName => "Send your new first name.",
        ProfileField::LastName => "Send your new last name.",
        ProfileField::WorkHours => {
            "Send your working hours as start-end in whole hours, for example 9-18."
        }
        ProfileField::Timezone => "Send your timezone, for example Europe/Berlin.",
    };
    views::text_prompt(text, false)
}

fn last_name_prompt() -> OutboundMessage {
    OutboundMessage::new(MessageKind::Prompt, "And your last name?")
        .with_button(views::button("‹ Back", &Command::Back))
}

impl<R, D, N, S, C> ConversationEngine<R, D, N, S, C>
where
    R: TaskRepository,
    D: UserDirectory,
    N: Notifier,
    S: SessionStore,
    C: Clock + Send + Sync,
{
    /// Handles any event from a user the directory does not know yet.
    pub(super) async fn registration(
        &self,
        user_id: &UserId,
        event: &InboundEvent,
    ) -> EngineResult<Replies> {
        let session = self
            .sessions
            .get(user_id)
            .await?
            .filter(|active| matches!(active.payload(), SessionPayload::Registration { .. }));
        let Some(active) = session else {
            self.start(
                user_id,
                WizardStep::RegistrationFirstName,
                SessionPayload::Registration { first_name: None },
            )
            .await?;
            info!(user_id = %user_id, "registration started");
            return Ok(vec![OutboundMessage::new(
                MessageKind::Prompt,
                "Welcome! Before we start, what is your first name?",
            )]);
        };
        match active.step() {
            WizardStep::RegistrationLastName => {
                self.registration_last_name(user_id, active, event).await
            }
            _ => self.registration_first_name(active, event).await,
        }
    }

    async fn registration_first_name(
        &self,
        session: Session,
        event: &InboundEvent,
    ) -> EngineResult<Replies> {
        let Some(text) = event.message_text() else {
            return Ok(vec![
                invalid(&InputError::TextExpected),
                OutboundMessage::new(MessageKind::Prompt, "What is your first name?"),
            ]);
        };
        let min = self.settings.name_min_chars;
        if char_len(text) < min {
            return Ok(vec![invalid(&InputError::NameTooShort { min })]);
        }
        self.advance(
            session,
            WizardStep::RegistrationLastName,
            SessionPayload::Registration {
                first_name: Some(text.to_owned()),
            },
        )
        .await?;
        Ok(vec![last_name_prompt()])
    }

    async fn registration_last_name(
        &self,
        user_id: &UserId,
        session: Session,
        event: &InboundEvent,
    ) -> EngineResult<Replies> {
        if event.command() == Some(&Command::Back) {
            self.advance(
                session,
                WizardStep::RegistrationFirstName,
                SessionPayload::Registration { first_name: None },
            )
            .await?;
            return Ok(vec![OutboundMessage::new(
                MessageKind::Prompt,
                "What is your first name?",
            )]);
        }
        let Some(text) = event.message_text() else {
            return Ok(vec![invalid(&InputError::TextExpected), last_name_prompt()]);
        };
        let min = self.settings.name_min_chars;
        if char_len(text) < min {
            return Ok(vec![invalid(&InputError::NameTooShort { min })]);
        }
        let first_name = match session.payload() {
            SessionPayload::Registration {
                first_name: Some(first),
            } => first.clone(),
            _ => return self.restart_registration(user_id).await,
        };
        let user = match User::register(user_id.clone(), first_name, text, self.clock.utc()) {
            Ok(registered) => registered,
            Err(err) => return Ok(vec![invalid(&InputError::from(err))]),
        };
        self.directory.store_user(&user).await?;
        self.sessions.clear(user_id).await?;
        info!(user_id = %user_id, "user registered");
        Ok(vec![
            views::notice(
                MessageKind::Info,
                format!("Nice to meet you, {}!", user.display_name()),
            ),
            views::tutorial(),
            views::main_menu(&user),
        ])
    }

    async fn restart_registration(&self, user_id: &UserId) -> EngineResult<Replies> {
        self.sessions.clear(user_id).await?;
        self.start(
            user_id,
            WizardStep::RegistrationFirstName,
            SessionPayload::Registration { first_name: None },
        )
        .await?;
        Ok(vec![OutboundMessage::new(
            MessageKind::Prompt,
            "What is your first name?",
        )])
    }

    pub(super) async fn start_profile_edit(
        &self,
        user: &User,
        field: ProfileField,
    ) -> EngineResult<Replies> {
        self.start(user.id(), profile_step_of(field), SessionPayload::Profile)
            .await?;
        Ok(vec![profile_prompt(field)])
    }

    pub(super) async fn tutorial_done(&self, user: &User) -> EngineResult<Replies> {
        let mut updated = user.clone();
        updated.finish_tutorial();
        self.directory.update_user(&updated).await?;
        Ok(vec![views::main_menu(&updated)])
    }

    pub(super) async fn profile_step(
        &self,
        user: &User,
        session: &Session,
        event: &InboundEvent,
    ) -> EngineResult<Replies> {
        if matches!(event.command(), Some(Command::Cancel | Command::Back)) {
            self.sessions.clear(user.id()).await?;
            return Ok(vec![views::profile_card(user)]);
        }
        let Some(text) = event.message_text() else {
            return Ok(vec![invalid(&InputError::TextExpected)]);
        };
        let mut updated = user.clone();
        let applied = match session.step() {
            WizardStep::ProfileFirstName | WizardStep::ProfileLastName => {
                let min = self.settings.name_min_chars;
                if char_len(text) < min {
                    return Ok(vec![invalid(&InputError::NameTooShort { min })]);
                }
                if session.step() == WizardStep::ProfileFirstName {
                    updated.set_first_name(text)
                } else {
                    updated.set_last_name(text)
                }
            }
            WizardStep::ProfileWorkHours => {
                WorkHours::parse(text).map(|hours| updated.set_work_hours(hours))
            }
            WizardStep::ProfileTimezone => {
                Timezone::parse(text).map(|zone| updated.set_timezone(zone))
            }
            _ => {
                self.sessions.clear(user.id()).await?;
                return Ok(vec![views::profile_card(user)]);
            }
        };
        if let Err(err) = applied {
            return Ok(vec![invalid(&InputError::from(err))]);
        }
        self.directory.update_user(&updated).await?;
        self.sessions.clear(user.id()).await?;
        info!(user_id = %user.id(), step = %session.step(), "profile updated");
        Ok(vec![
            views::notice(MessageKind::Info, "Saved."),
            views::profile_card(&updated),
        ])
    }
}
