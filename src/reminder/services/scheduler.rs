//! Reminder sweeps.
//!
//! Each sweep reads the current state from the ports, sends what is due, and
//! returns a [`SweepReport`]. Timestamps that suppress repeats
//! (`last_summary_sent_on`, `last_notified_at`) advance only after a
//! delivery succeeded, so a failed send is retried by the next sweep.

use super::error::ReminderResult;
use crate::directory::domain::{User, UserId};
use crate::directory::ports::UserDirectory;
use crate::notification::domain::OutboundMessage;
use crate::notification::ports::Notifier;
use crate::notification::services::{MessageRenderer, RenderError, Template};
use crate::reminder::domain::{Delivery, DueReminderJobs, SweepReport};
use crate::reminder::runtime::JobKind;
use crate::session::ports::SessionStore;
use crate::task::domain::{Task, TaskStatus};
use crate::task::ports::TaskRepository;
use crate::task::services::AssignmentResolver;
use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use minijinja::context;
use mockable::Clock;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

/// Task counts shown in a digest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DigestCounts {
    /// Active tasks.
    pub active: usize,
    /// Active tasks past their due date.
    pub overdue: usize,
    /// Active tasks due between today and Sunday, in the user's zone.
    pub due_this_week: usize,
}

impl DigestCounts {
    /// Counts `tasks` as seen at `now` from zone `tz`.
    #[must_use]
    pub fn of(tasks: &[Task], tz: Tz, now: DateTime<Utc>) -> Self {
        let today = now.with_timezone(&tz).date_naive();
        let days_left = 6_u32.saturating_sub(today.weekday().num_days_from_monday());
        let sunday = today
            .checked_add_days(Days::new(u64::from(days_left)))
            .unwrap_or(today);
        let active: Vec<&Task> = tasks
            .iter()
            .filter(|task| task.status() == TaskStatus::Active)
            .collect();
        Self {
            active: active.len(),
            overdue: active.iter().filter(|task| task.is_overdue(now)).count(),
            due_this_week: active
                .iter()
                .filter_map(|task| task.due_date())
                .map(|due| due.with_timezone(&tz).date_naive())
                .filter(|day| (today..=sunday).contains(day))
                .count(),
        }
    }
}

fn local_midnight(day: NaiveDate, tz: Tz) -> Option<DateTime<Utc>> {
    let midnight = day.and_hms_opt(0, 0, 0)?;
    tz.from_local_datetime(&midnight)
        .earliest()
        .map(|instant| instant.with_timezone(&Utc))
}

fn format_local(instant: DateTime<Utc>, tz: Tz) -> String {
    instant.with_timezone(&tz).format("%Y-%m-%d %H:%M").to_string()
}

/// Whether a delivery waits for the recipient's working hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gate {
    WorkHours,
    Always,
}

/// Background reminder jobs over the task and user stores.
pub struct ReminderScheduler<R, D, N, S, C>
where
    R: TaskRepository,
    D: UserDirectory,
    N: Notifier,
    S: SessionStore,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    directory: Arc<D>,
    notifier: Arc<N>,
    sessions: Arc<S>,
    clock: Arc<C>,
    resolver: AssignmentResolver<D>,
    renderer: MessageRenderer,
    due_reminders: Arc<DueReminderJobs>,
    timezone: Tz,
    session_ttl: Option<Duration>,
    resync: bool,
    last_due_soon: Mutex<Option<DateTime<Utc>>>,
}

impl<R, D, N, S, C> ReminderScheduler<R, D, N, S, C>
where
    R: TaskRepository,
    D: UserDirectory,
    N: Notifier,
    S: SessionStore,
    C: Clock + Send + Sync,
{
    /// Creates a scheduler working in UTC with session expiry disabled.
    #[must_use]
    pub fn new(
        repository: Arc<R>,
        directory: Arc<D>,
        notifier: Arc<N>,
        sessions: Arc<S>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            repository,
            resolver: AssignmentResolver::new(Arc::clone(&directory)),
            directory,
            notifier,
            sessions,
            clock,
            renderer: MessageRenderer::new(),
            due_reminders: Arc::new(DueReminderJobs::default()),
            timezone: Tz::UTC,
            session_ttl: None,
            resync: false,
            last_due_soon: Mutex::new(None),
        }
    }

    /// Shares the due reminder table with the lifecycle service.
    #[must_use]
    pub fn with_due_reminders(mut self, due_reminders: Arc<DueReminderJobs>) -> Self {
        self.due_reminders = due_reminders;
        self
    }

    /// Sets the zone the due-tomorrow window is computed in.
    #[must_use]
    pub const fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// Enables session expiry after `ttl` of inactivity.
    #[must_use]
    pub const fn with_session_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Reloads the due reminder table from storage before every due-soon
    /// sweep. Needed when tasks are written by another process.
    #[must_use]
    pub const fn with_resync(mut self, resync: bool) -> Self {
        self.resync = resync;
        self
    }

    /// Returns the due reminder table.
    #[must_use]
    pub const fn due_reminders(&self) -> &Arc<DueReminderJobs> {
        &self.due_reminders
    }

    /// Runs one sweep of `job`.
    ///
    /// # Errors
    ///
    /// Returns the error that aborted the sweep.
    pub async fn run(&self, job: JobKind) -> ReminderResult<SweepReport> {
        match job {
            JobKind::Digest => self.send_digests().await,
            JobKind::DueTomorrow => self.send_due_tomorrow().await,
            JobKind::IntervalNags => self.send_interval_nags().await,
            JobKind::DueSoon => Ok(self.send_due_soon().await),
            JobKind::SessionExpiry => self.expire_sessions().await,
        }
    }

    /// Repopulates the due reminder table from storage.
    ///
    /// # Errors
    ///
    /// Returns the repository error when active tasks cannot be listed.
    pub async fn rebuild_due_reminders(&self) -> ReminderResult<usize> {
        let tasks = self.repository.list_active_with_due_date().await?;
        let scheduled = self.due_reminders.rebuild(&tasks, self.clock.utc());
        info!(scheduled, "due reminders rebuilt");
        Ok(scheduled)
    }

    /// Sends the daily digest to every user whose working day has started
    /// and who has not had one today. A late run still catches up after
    /// working hours.
    ///
    /// # Errors
    ///
    /// Returns the directory error when users cannot be listed. Failures for
    /// one user are counted and logged instead.
    pub async fn send_digests(&self) -> ReminderResult<SweepReport> {
        let now = self.clock.utc();
        let mut report = SweepReport::default();
        for user in self.directory.list_users().await? {
            let user_id = user.id().clone();
            match self.digest_for(user, now).await {
                Ok(outcome) => report += SweepReport::single(outcome),
                Err(error) => {
                    warn!(job = "digest", user_id = %user_id, %error, "digest failed");
                    report += SweepReport::single(Delivery::Failed);
                }
            }
        }
        info!(job = "digest", %report, "sweep finished");
        Ok(report)
    }

    async fn digest_for(&self, mut user: User, now: DateTime<Utc>) -> ReminderResult<Delivery> {
        let today = user.local_date(now);
        if user.last_summary_sent_on() == Some(today) {
            return Ok(Delivery::Skipped);
        }
        if !user.has_started_work(now) {
            return Ok(Delivery::Deferred);
        }
        let tasks = self
            .repository
            .list_responsible(user.id(), user.roles(), &[TaskStatus::Active])
            .await?;
        let counts = DigestCounts::of(&tasks, user.timezone().tz(), now);
        let rendered = self.renderer.render(
            Template::Digest,
            context! {
                name => user.display_name(),
                active => counts.active,
                overdue => counts.overdue,
                due_this_week => counts.due_this_week,
            },
        );
        let outcome = self.send(user.id(), rendered).await;
        if outcome == Delivery::Delivered {
            user.mark_summary_sent(today);
            self.directory.update_user(&user).await?;
        }
        Ok(outcome)
    }

    /// Reminds responsible parties of active tasks due on the next calendar
    /// day of the scheduler's zone. The sweep runs once a day, so working
    /// hours are not checked.
    ///
    /// # Errors
    ///
    /// Returns the repository error when tasks cannot be listed.
    pub async fn send_due_tomorrow(&self) -> ReminderResult<SweepReport> {
        let now = self.clock.utc();
        let today = now.with_timezone(&self.timezone).date_naive();
        let window = today
            .checked_add_days(Days::new(1))
            .zip(today.checked_add_days(Days::new(2)))
            .and_then(|(tomorrow, after)| {
                local_midnight(tomorrow, self.timezone).zip(local_midnight(after, self.timezone))
            });
        let Some((start, end)) = window else {
            return Ok(SweepReport::default());
        };
        let mut report = SweepReport::default();
        for task in self.repository.list_active_due_between(start, end).await? {
            report += self
                .fan_out(&task, Gate::Always, now, |recipient| {
                    self.renderer.render(
                        Template::DueTomorrow,
                        context! {
                            title => task.title(),
                            due => task.due_date().map(|due| format_local(due, recipient.timezone().tz())),
                        },
                    )
                })
                .await;
        }
        info!(job = "due_tomorrow", %report, "sweep finished");
        Ok(report)
    }

    /// Sends interval reminders for open tasks whose interval has elapsed
    /// since the last reminder, or since creation.
    ///
    /// The reminder timestamp advances when at least one recipient got the
    /// message. A sweep where nobody got it leaves the task due for the
    /// next sweep.
    ///
    /// # Errors
    ///
    /// Returns the repository error when tasks cannot be listed.
    pub async fn send_interval_nags(&self) -> ReminderResult<SweepReport> {
        let now = self.clock.utc();
        let mut report = SweepReport::default();
        for task in self.repository.list_with_interval().await? {
            report += self.nag(&task, now).await;
        }
        info!(job = "interval_nags", %report, "sweep finished");
        Ok(report)
    }

    async fn nag(&self, task: &Task, now: DateTime<Utc>) -> SweepReport {
        let Some(interval) = task.notification_interval() else {
            return SweepReport::single(Delivery::Skipped);
        };
        let since = task.last_notified_at().unwrap_or_else(|| task.created_at());
        if now.signed_duration_since(since) < interval.as_duration() {
            return SweepReport::single(Delivery::Skipped);
        }
        let outcome = self
            .fan_out(task, Gate::WorkHours, now, |recipient| {
                let tz = recipient.timezone().tz();
                let due_today = task
                    .due_date()
                    .is_some_and(|due| due.with_timezone(&tz).date_naive() == recipient.local_date(now));
                self.renderer.render(
                    Template::IntervalReminder,
                    context! {
                        title => task.title(),
                        due => task.due_date().map(|due| format_local(due, tz)),
                        due_today => due_today,
                        progress => task.progress().map(|progress| progress.to_string()),
                    },
                )
            })
            .await;
        if outcome.delivered > 0 {
            let recorded = self
                .repository
                .modify(
                    task.id(),
                    Box::new(move |locked| {
                        locked.record_notified(now);
                        Ok(Vec::new())
                    }),
                )
                .await;
            if let Err(error) = recorded {
                warn!(job = "interval_nags", task_id = %task.id(), %error, "reminder time not recorded");
            }
        }
        outcome
    }

    /// Fires one-shot due reminders whose time has come.
    ///
    /// A reminder is dropped when its task is no longer active or was
    /// re-dated since it was scheduled. These reminders ignore working
    /// hours. Lookup failures are counted as failed deliveries.
    pub async fn send_due_soon(&self) -> SweepReport {
        let now = self.clock.utc();
        let previous = self
            .last_due_soon
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(now);
        if self.resync {
            // Reminders due at or before the previous sweep were already sent.
            match self.repository.list_active_with_due_date().await {
                Ok(tasks) => {
                    self.due_reminders.rebuild(&tasks, previous.unwrap_or(now));
                }
                Err(error) => warn!(job = "due_soon", %error, "due reminders not reloaded"),
            }
        }
        let mut report = SweepReport::default();
        for reminder in self.due_reminders.take_due(now) {
            let task = match self.repository.find_by_id(reminder.task_id).await {
                Ok(found) => found.filter(|candidate| {
                    candidate.status() == TaskStatus::Active
                        && candidate.due_date() == Some(reminder.due_date)
                }),
                Err(error) => {
                    warn!(job = "due_soon", task_id = %reminder.task_id, %error, "task lookup failed");
                    report += SweepReport::single(Delivery::Failed);
                    continue;
                }
            };
            let Some(current) = task else {
                debug!(job = "due_soon", task_id = %reminder.task_id, "stale due reminder dropped");
                report += SweepReport::single(Delivery::Skipped);
                continue;
            };
            report += self
                .fan_out(&current, Gate::Always, now, |recipient| {
                    self.renderer.render(
                        Template::DueSoon,
                        context! {
                            title => current.title(),
                            due => format_local(reminder.due_date, recipient.timezone().tz()),
                        },
                    )
                })
                .await;
        }
        if !report.is_idle() {
            info!(job = "due_soon", %report, "sweep finished");
        }
        report
    }

    /// Clears sessions idle for longer than the configured time-to-live.
    /// Does nothing when expiry is disabled.
    ///
    /// # Errors
    ///
    /// Returns the session store error.
    pub async fn expire_sessions(&self) -> ReminderResult<SweepReport> {
        let Some(ttl) = self.session_ttl else {
            return Ok(SweepReport::default());
        };
        let Some(cutoff) = self.clock.utc().checked_sub_signed(ttl) else {
            return Ok(SweepReport::default());
        };
        let cleared = self.sessions.clear_stale(cutoff).await?;
        for user in &cleared {
            debug!(job = "session_expiry", user_id = %user, "abandoned session cleared");
        }
        let report = SweepReport {
            cleared: cleared.len(),
            ..SweepReport::default()
        };
        if !report.is_idle() {
            info!(job = "session_expiry", %report, "sweep finished");
        }
        Ok(report)
    }

    /// Sends a per-recipient rendering of a task reminder to every
    /// responsible party.
    async fn fan_out<F>(&self, task: &Task, gate: Gate, now: DateTime<Utc>, render: F) -> SweepReport
    where
        F: Fn(&User) -> Result<OutboundMessage, RenderError> + Send + Sync,
    {
        let parties = match self.resolver.responsible_parties(task).await {
            Ok(parties) => parties,
            Err(error) => {
                warn!(task_id = %task.id(), %error, "could not resolve responsible parties");
                return SweepReport::single(Delivery::Failed);
            }
        };
        let mut report = SweepReport::default();
        for party in parties {
            let outcome = match self.directory.find_user(&party).await {
                Ok(Some(recipient)) if gate == Gate::WorkHours && !recipient.is_within_work_hours(now) => {
                    Delivery::Deferred
                }
                Ok(Some(recipient)) => self.send(recipient.id(), render(&recipient)).await,
                Ok(None) => Delivery::Skipped,
                Err(error) => {
                    warn!(task_id = %task.id(), user_id = %party, %error, "recipient lookup failed");
                    Delivery::Failed
                }
            };
            report += SweepReport::single(outcome);
        }
        report
    }

    async fn send(
        &self,
        recipient: &UserId,
        rendered: Result<OutboundMessage, RenderError>,
    ) -> Delivery {
        let message = match rendered {
            Ok(message) => message,
            Err(error) => {
                warn!(user_id = %recipient, %error, "reminder not rendered");
                return Delivery::Failed;
            }
        };
        match self.notifier.send(recipient, &message).await {
            Ok(()) => Delivery::Delivered,
            Err(error) => {
                warn!(user_id = %recipient, kind = ?message.kind(), %error, "reminder not delivered");
                Delivery::Failed
            }
        }
    }
}
