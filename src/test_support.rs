//! Shared fixtures for unit tests: a small team wired to in-memory
//! adapters and a manual clock.

use crate::clock::ManualClock;
use crate::directory::adapters::memory::InMemoryUserDirectory;
use crate::directory::domain::{Role, RoleId, User, UserId};
use crate::directory::ports::UserDirectory;
use crate::notification::adapters::RecordingNotifier;
use crate::reminder::domain::DueReminderJobs;
use crate::session::adapters::memory::InMemorySessionStore;
use crate::task::adapters::memory::InMemoryTaskRepository;
use crate::task::services::TaskLifecycleService;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;

pub(crate) type Lifecycle = TaskLifecycleService<
    InMemoryTaskRepository,
    InMemoryUserDirectory,
    RecordingNotifier,
    ManualClock,
>;

/// Monday 2026-10-12, 10:00 UTC: inside default working hours.
pub(crate) fn monday_morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 12, 10, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(crate) fn uid(value: &str) -> UserId {
    UserId::new(value).expect("valid user id")
}

/// Creator, direct assignee, two role members, an outsider, and an admin.
pub(crate) struct Team {
    pub(crate) repository: Arc<InMemoryTaskRepository>,
    pub(crate) directory: Arc<InMemoryUserDirectory>,
    pub(crate) notifier: Arc<RecordingNotifier>,
    pub(crate) sessions: Arc<InMemorySessionStore>,
    pub(crate) clock: Arc<ManualClock>,
    pub(crate) due_reminders: Arc<DueReminderJobs>,
    pub(crate) creator: User,
    pub(crate) worker: User,
    pub(crate) picker_a: User,
    pub(crate) picker_b: User,
    pub(crate) outsider: User,
    pub(crate) admin: User,
    pub(crate) pickers: RoleId,
}

impl Team {
    pub(crate) async fn assemble() -> Self {
        let now = monday_morning();
        let directory = Arc::new(InMemoryUserDirectory::new());
        let pickers = RoleId::new(1).expect("valid role id");
        directory
            .store_role(&Role::new(pickers, "Pickers", "Warehouse pickers").expect("valid role"))
            .await
            .expect("role stored");
        let register = |id: &str, first: &str, last: &str| {
            User::register(uid(id), first, last, now).expect("valid registration")
        };
        let people = [
            register("100", "Alice", "Creator"),
            register("200", "Bob", "Worker"),
            register("301", "Cara", "Picker"),
            register("302", "Dan", "Picker"),
            register("400", "Olga", "Outsider"),
            register("500", "Ada", "Admin").with_admin(true),
        ];
        for person in &people {
            directory.store_user(person).await.expect("user stored");
        }
        for member in ["301", "302"] {
            directory
                .assign_role(&uid(member), pickers)
                .await
                .expect("role assigned");
        }
        let load = |id: &'static str| {
            let directory = Arc::clone(&directory);
            async move {
                directory
                    .find_user(&uid(id))
                    .await
                    .expect("lookup")
                    .expect("registered user")
            }
        };
        Self {
            creator: load("100").await,
            worker: load("200").await,
            picker_a: load("301").await,
            picker_b: load("302").await,
            outsider: load("400").await,
            admin: load("500").await,
            repository: Arc::new(InMemoryTaskRepository::new()),
            notifier: Arc::new(RecordingNotifier::new()),
            sessions: Arc::new(InMemorySessionStore::new()),
            clock: Arc::new(ManualClock::new(now)),
            due_reminders: Arc::new(DueReminderJobs::default()),
            directory,
            pickers,
        }
    }

    pub(crate) fn lifecycle(&self) -> Lifecycle {
        TaskLifecycleService::new(
            Arc::clone(&self.repository),
            Arc::clone(&self.directory),
            Arc::clone(&self.notifier),
            Arc::clone(&self.clock),
        )
        .with_due_reminders(Arc::clone(&self.due_reminders))
    }

    /// Reloads `user` from the directory.
    pub(crate) async fn reload(&self, user: &User) -> User {
        self.directory
            .find_user(user.id())
            .await
            .expect("lookup")
            .expect("registered user")
    }
}
