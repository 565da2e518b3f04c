//! Shared harness for in-memory integration tests.
//!
//! A [`Harness`] wires the conversation engine, the lifecycle service, and
//! the reminder scheduler to one set of in-memory adapters and a manual
//! clock, the same way the scheduler binary wires them to Postgres.

use brigade::clock::ManualClock;
use brigade::conversation::{
    Command, ConversationEngine, ConversationSettings, InboundEvent, Replies,
};
use brigade::directory::adapters::memory::InMemoryUserDirectory;
use brigade::directory::domain::{Role, RoleId, User, UserId};
use brigade::directory::ports::UserDirectory;
use brigade::notification::adapters::RecordingNotifier;
use brigade::notification::domain::{MessageKind, OutboundMessage};
use brigade::reminder::domain::DueReminderJobs;
use brigade::reminder::services::ReminderScheduler;
use brigade::session::adapters::memory::InMemorySessionStore;
use brigade::session::domain::{Session, WizardStep};
use brigade::session::ports::SessionStore;
use brigade::task::adapters::memory::InMemoryTaskRepository;
use brigade::task::domain::{Task, TaskId};
use brigade::task::ports::TaskRepository;
use brigade::task::services::TaskLifecycleService;
use chrono::{DateTime, TimeZone, Utc};
use rstest::fixture;
use std::sync::Arc;

/// Lifecycle service over the in-memory adapters.
pub type Lifecycle = TaskLifecycleService<
    InMemoryTaskRepository,
    InMemoryUserDirectory,
    RecordingNotifier,
    ManualClock,
>;

/// Conversation engine over the in-memory adapters.
pub type Engine = ConversationEngine<
    InMemoryTaskRepository,
    InMemoryUserDirectory,
    RecordingNotifier,
    InMemorySessionStore,
    ManualClock,
>;

/// Reminder scheduler over the in-memory adapters.
pub type Scheduler = ReminderScheduler<
    InMemoryTaskRepository,
    InMemoryUserDirectory,
    RecordingNotifier,
    InMemorySessionStore,
    ManualClock,
>;

/// Monday 2026-10-12, 10:00 UTC.
pub fn monday_morning() -> DateTime<Utc> {
    at(12, 10, 0)
}

/// An instant in October 2026, UTC.
pub fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, day, hour, minute, 0)
        .single()
        .expect("valid timestamp")
}

/// One team and every service built on its storage.
pub struct Harness {
    pub repository: Arc<InMemoryTaskRepository>,
    pub directory: Arc<InMemoryUserDirectory>,
    pub notifier: Arc<RecordingNotifier>,
    pub sessions: Arc<InMemorySessionStore>,
    pub clock: Arc<ManualClock>,
    pub due_reminders: Arc<DueReminderJobs>,
    pub engine: Engine,
    pub scheduler: Scheduler,
    pub creator: User,
    pub worker: User,
    pub picker_a: User,
    pub picker_b: User,
    pub pickers: RoleId,
}

impl Harness {
    /// Builds the harness with a creator, a worker, and a two-person role.
    pub async fn assemble() -> Self {
        let now = monday_morning();
        let repository = Arc::new(InMemoryTaskRepository::new());
        let directory = Arc::new(InMemoryUserDirectory::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let sessions = Arc::new(InMemorySessionStore::new());
        let clock = Arc::new(ManualClock::new(now));
        let due_reminders = Arc::new(DueReminderJobs::default());

        let pickers = RoleId::new(1).expect("valid role id");
        directory
            .store_role(&Role::new(pickers, "Pickers", "Warehouse floor").expect("valid role"))
            .await
            .expect("role stored");
        let people = [
            ("100", "Alice", "Creator"),
            ("200", "Bob", "Worker"),
            ("301", "Cara", "Picker"),
            ("302", "Dan", "Picker"),
        ];
        for (id, first, last) in people {
            let user = User::register(user_id(id), first, last, now).expect("valid user");
            directory.store_user(&user).await.expect("user stored");
        }
        for member in ["301", "302"] {
            directory
                .assign_role(&user_id(member), pickers)
                .await
                .expect("role assigned");
        }

        let lifecycle = TaskLifecycleService::new(
            Arc::clone(&repository),
            Arc::clone(&directory),
            Arc::clone(&notifier),
            Arc::clone(&clock),
        )
        .with_due_reminders(Arc::clone(&due_reminders));
        let engine = ConversationEngine::new(
            lifecycle,
            Arc::clone(&directory),
            Arc::clone(&sessions),
            Arc::clone(&clock),
            ConversationSettings::default(),
        );
        let scheduler = ReminderScheduler::new(
            Arc::clone(&repository),
            Arc::clone(&directory),
            Arc::clone(&notifier),
            Arc::clone(&sessions),
            Arc::clone(&clock),
        )
        .with_due_reminders(Arc::clone(&due_reminders));

        let lookup = |id: &str| {
            let users = Arc::clone(&directory);
            let wanted = user_id(id);
            async move {
                users
                    .find_user(&wanted)
                    .await
                    .expect("lookup")
                    .expect("registered user")
            }
        };
        Self {
            creator: lookup("100").await,
            worker: lookup("200").await,
            picker_a: lookup("301").await,
            picker_b: lookup("302").await,
            repository,
            directory,
            notifier,
            sessions,
            clock,
            due_reminders,
            engine,
            scheduler,
            pickers,
        }
    }

    /// Lifecycle service shared with the engine.
    pub const fn lifecycle(&self) -> &Lifecycle {
        self.engine.lifecycle()
    }

    /// Sends a button press from `user`.
    pub async fn press(&self, user: &User, command: Command) -> Replies {
        self.engine
            .handle(InboundEvent::button(user.id().clone(), command))
            .await
            .expect("event handled")
    }

    /// Sends a text message from `user`.
    pub async fn say(&self, user: &User, text: &str) -> Replies {
        self.engine
            .handle(InboundEvent::text(user.id().clone(), text))
            .await
            .expect("event handled")
    }

    /// Active session of `user`.
    pub async fn session(&self, user: &User) -> Option<Session> {
        self.sessions.get(user.id()).await.expect("session lookup")
    }

    /// Active wizard step of `user`.
    pub async fn step(&self, user: &User) -> Option<WizardStep> {
        self.session(user).await.map(|session| session.step())
    }

    /// Stored task.
    pub async fn task(&self, id: TaskId) -> Task {
        self.repository
            .find_by_id(id)
            .await
            .expect("task lookup")
            .expect("task exists")
    }

    /// The only task `user` created.
    pub async fn only_task_of(&self, user: &User) -> Task {
        let mut created = self
            .repository
            .list_created_by(user.id())
            .await
            .expect("task listing");
        assert_eq!(created.len(), 1, "expected exactly one task");
        created.pop().expect("one task")
    }

    /// Kinds of the messages delivered to `user`.
    pub fn received(&self, user: &User) -> Vec<MessageKind> {
        kinds(&self.notifier.sent_to(user.id()))
    }
}

/// Parses a user id.
pub fn user_id(value: &str) -> UserId {
    UserId::new(value).expect("valid user id")
}

/// Kinds of a list of messages, in order.
pub fn kinds(messages: &[OutboundMessage]) -> Vec<MessageKind> {
    messages.iter().map(OutboundMessage::kind).collect()
}

/// Text of the first message, or the empty string.
pub fn first_text(messages: &[OutboundMessage]) -> &str {
    messages.first().map_or("", OutboundMessage::text)
}

/// Provides a fresh harness for each test.
#[fixture]
pub async fn harness() -> Harness {
    Harness::assemble().await
}
