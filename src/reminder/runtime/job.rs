//! Job table: which recurring job is due, late, or still running.

use crate::reminder::settings::{SchedulerSettings, SettingsError};
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use cron::Schedule;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

/// Recurring jobs run by the scheduler runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    /// Daily digest.
    Digest,
    /// Reminder for tasks due tomorrow.
    DueTomorrow,
    /// Interval reminders.
    IntervalNags,
    /// One-shot reminders ahead of a due date.
    DueSoon,
    /// Expiry of abandoned sessions.
    SessionExpiry,
}

impl JobKind {
    /// Every job, in evaluation order.
    pub const ALL: [Self; 5] = [
        Self::Digest,
        Self::DueTomorrow,
        Self::IntervalNags,
        Self::DueSoon,
        Self::SessionExpiry,
    ];

    /// Name used in settings and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Digest => "digest",
            Self::DueTomorrow => "due_tomorrow",
            Self::IntervalNags => "interval_nags",
            Self::DueSoon => "due_soon",
            Self::SessionExpiry => "session_expiry",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decision taken for a job whose fire time has passed.
#[derive(Debug)]
pub enum Dispatch {
    /// Start the job. The permit is held until the run finishes.
    Run {
        /// Job to run.
        kind: JobKind,
        /// Instance slot of the job.
        permit: OwnedSemaphorePermit,
    },
    /// The fire time is older than the misfire grace; the run is dropped.
    Misfired {
        /// Job that missed its time.
        kind: JobKind,
        /// How late the evaluation came.
        late: Duration,
    },
    /// Every instance slot of the job is taken; the run is dropped.
    Busy(JobKind),
}

impl Dispatch {
    /// Job the decision is about.
    #[must_use]
    pub const fn kind(&self) -> JobKind {
        match self {
            Self::Run { kind, .. } | Self::Misfired { kind, .. } => *kind,
            Self::Busy(kind) => *kind,
        }
    }
}

#[derive(Debug)]
struct ScheduledJob {
    kind: JobKind,
    schedule: Schedule,
    next_run: Option<DateTime<Utc>>,
    instances: Arc<Semaphore>,
}

/// Recurring jobs with their next fire times.
#[derive(Debug)]
pub struct JobTable {
    jobs: Vec<ScheduledJob>,
    timezone: Tz,
    grace: Duration,
}

impl JobTable {
    /// Builds the table from settings, with first fire times after `now`.
    ///
    /// # Errors
    ///
    /// Returns a [`SettingsError`] when a schedule or the timezone is
    /// invalid.
    pub fn new(settings: &SchedulerSettings, now: DateTime<Utc>) -> Result<Self, SettingsError> {
        let timezone = settings.zone()?;
        let jobs = settings
            .schedules()?
            .into_iter()
            .map(|(kind, schedule)| {
                let next_run = next_after(&schedule, timezone, now);
                ScheduledJob {
                    kind,
                    schedule,
                    next_run,
                    instances: Arc::new(Semaphore::new(settings.max_instances)),
                }
            })
            .collect();
        Ok(Self {
            jobs,
            timezone,
            grace: settings.misfire_grace(),
        })
    }

    /// Next fire time of `kind`, if the job is scheduled.
    #[must_use]
    pub fn next_run(&self, kind: JobKind) -> Option<DateTime<Utc>> {
        self.jobs
            .iter()
            .find(|job| job.kind == kind)
            .and_then(|job| job.next_run)
    }

    /// Decides what happens to every job whose fire time is at or before
    /// `now`, and moves those jobs to their next fire time.
    ///
    /// Missed fire times collapse into one decision per job.
    pub fn plan(&mut self, now: DateTime<Utc>) -> Vec<Dispatch> {
        let mut decisions = Vec::new();
        for job in &mut self.jobs {
            let Some(fire_at) = job.next_run.filter(|fire_at| *fire_at <= now) else {
                continue;
            };
            job.next_run = next_after(&job.schedule, self.timezone, now);
            let late = now.signed_duration_since(fire_at);
            if late > self.grace {
                decisions.push(Dispatch::Misfired {
                    kind: job.kind,
                    late,
                });
                continue;
            }
            match Arc::clone(&job.instances).try_acquire_owned() {
                Ok(permit) => decisions.push(Dispatch::Run {
                    kind: job.kind,
                    permit,
                }),
                Err(_) => decisions.push(Dispatch::Busy(job.kind)),
            }
            debug!(job = %job.kind, next_run = ?job.next_run, "job evaluated");
        }
        decisions
    }
}

fn next_after(schedule: &Schedule, timezone: Tz, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    schedule
        .after(&now.with_timezone(&timezone))
        .next()
        .map(|instant| instant.with_timezone(&Utc))
}
