//! Cron-driven runtime for the reminder jobs.

mod job;
mod runner;

pub use job::{Dispatch, JobKind, JobTable};
pub use runner::{SchedulerError, SchedulerRuntime};
