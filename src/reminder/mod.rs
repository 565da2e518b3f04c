//! Background reminders: daily digests, due-date reminders, interval
//! reminders, and expiry of abandoned sessions.
//!
//! [`services::ReminderScheduler`] implements each sweep against the
//! ports; [`runtime::SchedulerRuntime`] fires the sweeps on cron schedules
//! with a bounded pool, per-job instance limits, and a misfire grace.

pub mod domain;
pub mod runtime;
pub mod services;
pub mod settings;

#[cfg(test)]
mod tests;
