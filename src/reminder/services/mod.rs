//! Reminder sweeps over the task, user, and session stores.

mod error;
mod scheduler;

pub use error::{ReminderError, ReminderResult};
pub use scheduler::{DigestCounts, ReminderScheduler};
