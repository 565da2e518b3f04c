//! Reminder bookkeeping shared by the lifecycle service and the scheduler.

mod due_jobs;
mod report;

pub use due_jobs::{DueReminder, DueReminderJobs};
pub use report::{Delivery, SweepReport};
