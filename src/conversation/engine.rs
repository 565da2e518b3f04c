//! Event routing for the conversation engine.
//!
//! Each inbound event is handled to completion while holding a per-user
//! lock, so two events of the same user never interleave. Wizard state lives
//! in the [`SessionStore`]; the engine itself keeps nothing between events
//! except the lock table.

use super::command::Command;
use super::error::{EngineError, EngineResult, InputError};
use super::event::InboundEvent;
use super::settings::ConversationSettings;
use super::views::{self, CardContext};
use crate::directory::domain::{User, UserId};
use crate::directory::ports::UserDirectory;
use crate::notification::domain::{MessageKind, OutboundMessage};
use crate::notification::ports::Notifier;
use crate::session::domain::{CreationDraft, Session, SessionPayload, WizardStep};
use crate::session::ports::SessionStore;
use crate::task::domain::{Assignment, Task, TaskId};
use crate::task::ports::TaskRepository;
use crate::task::services::{TaskLifecycleError, TaskLifecycleResult, TaskLifecycleService};
use chrono::NaiveTime;
use mockable::Clock;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

/// Replies to the sender of an event, in display order.
pub type Replies = Vec<OutboundMessage>;

type UserLocks = HashMap<UserId, Arc<tokio::sync::Mutex<()>>>;

/// Wizard driver and action dispatcher.
pub struct ConversationEngine<R, D, N, S, C>
where
    R: TaskRepository,
    D: UserDirectory,
    N: Notifier,
    S: SessionStore,
    C: Clock + Send + Sync,
{
    pub(super) lifecycle: TaskLifecycleService<R, D, N, C>,
    pub(super) directory: Arc<D>,
    pub(super) sessions: Arc<S>,
    pub(super) clock: Arc<C>,
    pub(super) settings: ConversationSettings,
    pub(super) slots: Vec<NaiveTime>,
    locks: Mutex<UserLocks>,
}

impl<R, D, N, S, C> ConversationEngine<R, D, N, S, C>
where
    R: TaskRepository,
    D: UserDirectory,
    N: Notifier,
    S: SessionStore,
    C: Clock + Send + Sync,
{
    /// Creates an engine on top of a lifecycle service.
    ///
    /// The lifecycle service's delete policy is replaced by the one in
    /// `settings`.
    #[must_use]
    pub fn new(
        lifecycle: TaskLifecycleService<R, D, N, C>,
        directory: Arc<D>,
        sessions: Arc<S>,
        clock: Arc<C>,
        settings: ConversationSettings,
    ) -> Self {
        let slots = settings.parsed_time_slots();
        Self {
            lifecycle: lifecycle.with_delete_policy(settings.delete_policy),
            directory,
            sessions,
            clock,
            slots,
            settings,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the wizard settings.
    #[must_use]
    pub const fn settings(&self) -> &ConversationSettings {
        &self.settings
    }

    /// Returns the lifecycle service.
    #[must_use]
    pub const fn lifecycle(&self) -> &TaskLifecycleService<R, D, N, C> {
        &self.lifecycle
    }

    /// Handles one inbound event and returns the replies for its sender.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] only for infrastructure failures. Refusals
    /// are replies.
    pub async fn handle(&self, event: InboundEvent) -> EngineResult<Replies> {
        let user_id = event.user().clone();
        let gate = self.user_gate(&user_id);
        let guard = gate.lock().await;
        let outcome = self.route(&event).await;
        drop(guard);
        self.release_gate(&user_id, &gate);
        outcome
    }

    fn user_gate(&self, user: &UserId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(user.clone()).or_default())
    }

    fn release_gate(&self, user: &UserId, gate: &Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the table plus ours means nobody else is waiting.
        if Arc::strong_count(gate) == 2 {
            locks.remove(user);
        }
    }

    async fn route(&self, event: &InboundEvent) -> EngineResult<Replies> {
        let user_id = event.user();
        let Some(user) = self.directory.find_user(user_id).await? else {
            return self.registration(user_id, event).await;
        };
        let session = self.sessions.get(user_id).await?;
        if let Some(command) = event.command().filter(|command| command.is_navigation()) {
            if let Some(abandoned) = session {
                debug!(user_id = %user_id, step = %abandoned.step(), "wizard abandoned by navigation");
                self.sessions.clear(user_id).await?;
            }
            return self.navigate(&user, command).await;
        }
        match session {
            Some(active) => self.continue_wizard(&user, active, event).await,
            None => self.idle(&user, event).await,
        }
    }

    async fn continue_wizard(
        &self,
        user: &User,
        session: Session,
        event: &InboundEvent,
    ) -> EngineResult<Replies> {
        if event.command() == Some(&Command::Noop) {
            return Ok(Vec::new());
        }
        match session.payload().clone() {
            SessionPayload::Creation(draft) => self.creation_step(user, session, draft, event).await,
            SessionPayload::Edit(edit) => self.edit_step(user, session, edit, event).await,
            SessionPayload::Profile => self.profile_step(user, &session, event).await,
            SessionPayload::Report {
                task_id,
                attachments,
            } => {
                self.report_step(user, session, task_id, attachments, event)
                    .await
            }
            SessionPayload::Comment { task_id } => self.comment_step(user, task_id, event).await,
            SessionPayload::Registration { .. } => {
                self.sessions.clear(user.id()).await?;
                Ok(vec![views::main_menu(user)])
            }
        }
    }

    async fn idle(&self, user: &User, event: &InboundEvent) -> EngineResult<Replies> {
        match event {
            InboundEvent::ButtonPress { command, .. } => self.act(user, command).await,
            InboundEvent::Message { .. } => Ok(vec![views::main_menu(user)]),
        }
    }

    pub(super) async fn navigate(&self, user: &User, command: &Command) -> EngineResult<Replies> {
        match command {
            Command::MyTasks => {
                let tasks = self.lifecycle.list_responsible_tasks(user).await?;
                Ok(vec![views::task_list("Your tasks", &tasks, self.clock.utc())])
            }
            Command::CreatedTasks => {
                let tasks = self.lifecycle.list_created_tasks(user).await?;
                Ok(vec![views::task_list(
                    "Tasks you created",
                    &tasks,
                    self.clock.utc(),
                )])
            }
            Command::Profile => Ok(vec![views::profile_card(user)]),
            Command::CreateTask => {
                self.start(
                    user.id(),
                    WizardStep::TaskTitle,
                    SessionPayload::Creation(CreationDraft::default()),
                )
                .await?;
                info!(user_id = %user.id(), "task creation started");
                Ok(vec![views::title_prompt(self.settings.title_min_chars)])
            }
            Command::Start if !user.tutorial_finished() => {
                Ok(vec![views::main_menu(user), views::tutorial()])
            }
            _ => Ok(vec![views::main_menu(user)]),
        }
    }

    pub(super) async fn start(
        &self,
        user: &UserId,
        step: WizardStep,
        payload: SessionPayload,
    ) -> EngineResult<()> {
        let session = Session::start(user.clone(), step, payload, self.clock.utc())?;
        self.sessions.set(&session).await?;
        Ok(())
    }

    pub(super) async fn advance(
        &self,
        session: Session,
        step: WizardStep,
        payload: SessionPayload,
    ) -> EngineResult<()> {
        let next = session.advance(step, payload, self.clock.utc())?;
        self.sessions.set(&next).await?;
        Ok(())
    }

    /// Human-readable responsible party of a task.
    pub(super) async fn assignee_label(&self, task: &Task) -> EngineResult<String> {
        Ok(match task.assignment() {
            Assignment::User(id) => self
                .directory
                .find_user(id)
                .await?
                .map_or_else(|| id.to_string(), |assignee| assignee.display_name()),
            Assignment::Role(id) => self
                .directory
                .find_role(*id)
                .await?
                .map_or_else(|| format!("role {id}"), |role| format!("role {}", role.name())),
        })
    }

    pub(super) async fn card(&self, user: &User, task: &Task) -> EngineResult<OutboundMessage> {
        let label = self.assignee_label(task).await?;
        Ok(views::task_card(
            task,
            CardContext {
                viewer: user,
                assignee_label: &label,
                now: self.clock.utc(),
                delete_policy: self.settings.delete_policy,
            },
        ))
    }

    /// Confirmation followed by the task card, or the refusal.
    pub(super) async fn outcome(
        &self,
        user: &User,
        result: TaskLifecycleResult<Task>,
        confirmation: &str,
    ) -> EngineResult<Replies> {
        match result {
            Ok(task) => Ok(vec![
                views::notice(MessageKind::Info, confirmation),
                self.card(user, &task).await?,
            ]),
            Err(err) => Ok(vec![refusal(err)?]),
        }
    }

    /// Task card, or the refusal when the task is gone or hidden.
    pub(super) async fn view(&self, user: &User, id: TaskId) -> EngineResult<OutboundMessage> {
        match self.lifecycle.view_task(user, id).await {
            Ok(task) => self.card(user, &task).await,
            Err(err) => refusal(err),
        }
    }
}

/// Turns a lifecycle failure into a reply, keeping storage failures as
/// errors.
pub(super) fn refusal(err: TaskLifecycleError) -> EngineResult<OutboundMessage> {
    match err {
        failure if failure.is_infrastructure() => Err(EngineError::Lifecycle(failure)),
        TaskLifecycleError::AccessDenied(_) => Ok(views::notice(
            MessageKind::PermissionDenied,
            "You don't have permission to do that.",
        )),
        TaskLifecycleError::TaskNotFound(_) => Ok(views::notice(
            MessageKind::NotFound,
            "This task no longer exists.",
        )),
        other => Ok(views::notice(
            MessageKind::ValidationError,
            format!("⚠ {}", capitalized(&other.to_string())),
        )),
    }
}

/// Returns `true` when the refusal makes the wizard pointless to keep.
pub(super) const fn ends_wizard(err: &TaskLifecycleError) -> bool {
    matches!(
        err,
        TaskLifecycleError::AccessDenied(_) | TaskLifecycleError::TaskNotFound(_)
    )
}

/// Reply for input refused at the current step.
pub(super) fn invalid(err: &InputError) -> OutboundMessage {
    views::notice(
        MessageKind::ValidationError,
        format!("⚠ {}", capitalized(&err.to_string())),
    )
}

/// Reply for a button that does not belong to the active wizard.
pub(super) fn out_of_place() -> OutboundMessage {
    views::notice(
        MessageKind::Info,
        "Finish the current step or press Cancel first.",
    )
}

fn capitalized(text: &str) -> String {
    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Number of characters after trimming.
pub(super) fn char_len(text: &str) -> usize {
    text.trim().chars().count()
}
