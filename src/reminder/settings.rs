//! Scheduler settings.

use crate::reminder::runtime::JobKind;
use chrono::Duration;
use chrono_tz::Tz;
use cron::Schedule;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Cron expressions (six fields, seconds first) of the recurring jobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobSchedules {
    /// Daily digest; idempotent per user and day, so it can fire hourly.
    pub digest: String,
    /// Due-tomorrow sweep.
    pub due_tomorrow: String,
    /// Interval reminder sweep.
    pub interval_nags: String,
    /// Poll of one-shot due reminders.
    pub due_soon: String,
    /// Expiry of abandoned sessions.
    pub session_expiry: String,
}

impl Default for JobSchedules {
    fn default() -> Self {
        Self {
            digest: "0 0 * * * *".to_owned(),
            due_tomorrow: "0 0 9 * * *".to_owned(),
            interval_nags: "0 * * * * *".to_owned(),
            due_soon: "30 * * * * *".to_owned(),
            session_expiry: "0 */10 * * * *".to_owned(),
        }
    }
}

impl JobSchedules {
    /// Cron expression of `job`.
    #[must_use]
    pub fn expression(&self, job: JobKind) -> &str {
        match job {
            JobKind::Digest => &self.digest,
            JobKind::DueTomorrow => &self.due_tomorrow,
            JobKind::IntervalNags => &self.interval_nags,
            JobKind::DueSoon => &self.due_soon,
            JobKind::SessionExpiry => &self.session_expiry,
        }
    }
}

/// Settings of the reminder scheduler and its runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    /// Jobs executing at the same time, across all jobs.
    pub pool_size: usize,
    /// Concurrent executions allowed per job.
    pub max_instances: usize,
    /// How late a job may start and still run, in seconds.
    pub misfire_grace_secs: u64,
    /// Interval between schedule evaluations, in seconds.
    pub tick_secs: u64,
    /// Zone the cron expressions and the due-tomorrow window are read in.
    pub timezone: String,
    /// Lead time of one-shot due reminders, in hours.
    pub due_soon_lead_hours: u32,
    /// Idle time after which a session is cleared, in minutes. `None`
    /// keeps sessions forever.
    pub session_ttl_minutes: Option<u32>,
    /// Job schedules.
    pub jobs: JobSchedules,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            pool_size: 2,
            max_instances: 1,
            misfire_grace_secs: 30,
            tick_secs: 15,
            timezone: "UTC".to_owned(),
            due_soon_lead_hours: 24,
            session_ttl_minutes: None,
            jobs: JobSchedules::default(),
        }
    }
}

/// Invalid scheduler settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A cron expression does not parse.
    #[error("invalid cron expression for {job}: {source}")]
    Cron {
        /// Job whose expression failed.
        job: JobKind,
        /// Parser error.
        source: cron::error::Error,
    },

    /// The timezone is not a known IANA zone.
    #[error("unknown scheduler timezone '{0}'")]
    Timezone(String),

    /// A size or duration that must be positive is zero.
    #[error("{0} must be at least 1")]
    Zero(&'static str),
}

impl SchedulerSettings {
    /// Checks every field the runtime depends on.
    ///
    /// # Errors
    ///
    /// Returns the first [`SettingsError`] found.
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.zone()?;
        self.schedules()?;
        if self.pool_size == 0 {
            return Err(SettingsError::Zero("pool_size"));
        }
        if self.max_instances == 0 {
            return Err(SettingsError::Zero("max_instances"));
        }
        if self.tick_secs == 0 {
            return Err(SettingsError::Zero("tick_secs"));
        }
        Ok(())
    }

    /// Parsed scheduler timezone.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Timezone`] for an unknown zone.
    pub fn zone(&self) -> Result<Tz, SettingsError> {
        self.timezone
            .trim()
            .parse::<Tz>()
            .map_err(|_| SettingsError::Timezone(self.timezone.clone()))
    }

    /// Parsed job schedules.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Cron`] for the first invalid expression.
    pub fn schedules(&self) -> Result<Vec<(JobKind, Schedule)>, SettingsError> {
        JobKind::ALL
            .into_iter()
            .map(|job| {
                Schedule::from_str(self.jobs.expression(job))
                    .map(|schedule| (job, schedule))
                    .map_err(|source| SettingsError::Cron { job, source })
            })
            .collect()
    }

    /// Misfire grace window.
    #[must_use]
    pub fn misfire_grace(&self) -> Duration {
        i64::try_from(self.misfire_grace_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX)
    }

    /// Lead time of one-shot due reminders.
    #[must_use]
    pub fn due_soon_lead(&self) -> Duration {
        Duration::hours(i64::from(self.due_soon_lead_hours))
    }

    /// Session time-to-live, if enabled.
    #[must_use]
    pub fn session_ttl(&self) -> Option<Duration> {
        self.session_ttl_minutes
            .filter(|minutes| *minutes > 0)
            .map(|minutes| Duration::minutes(i64::from(minutes)))
    }
}
