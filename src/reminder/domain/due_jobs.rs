//! One-shot reminders fired a fixed lead time before a task's due date.

use crate::task::domain::{Task, TaskId, TaskStatus};
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Pending one-shot reminder for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueReminder {
    /// Task the reminder belongs to.
    pub task_id: TaskId,
    /// When the reminder should fire.
    pub fire_at: DateTime<Utc>,
    /// Due date the reminder was computed from.
    pub due_date: DateTime<Utc>,
}

/// In-memory table of one-shot due reminders keyed by task.
///
/// At most one reminder exists per task; scheduling again replaces it. The
/// table is rebuilt from storage at scheduler start, so losing it on restart
/// only delays reminders until the next rebuild.
#[derive(Debug)]
pub struct DueReminderJobs {
    lead: Duration,
    jobs: Mutex<BTreeMap<TaskId, DueReminder>>,
}

impl DueReminderJobs {
    /// Creates an empty table firing `lead` before each due date.
    #[must_use]
    pub const fn new(lead: Duration) -> Self {
        Self {
            lead,
            jobs: Mutex::new(BTreeMap::new()),
        }
    }

    /// Returns the lead time.
    #[must_use]
    pub const fn lead(&self) -> Duration {
        self.lead
    }

    fn guard(&self) -> MutexGuard<'_, BTreeMap<TaskId, DueReminder>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Schedules or replaces the reminder for `task`.
    ///
    /// Tasks that are not active, have no due date, or whose fire time is
    /// not in the future lose any existing reminder instead. Returns `true`
    /// when a reminder is pending afterwards.
    pub fn schedule(&self, task: &Task, now: DateTime<Utc>) -> bool {
        let candidate = task
            .due_date()
            .filter(|_| task.status() == TaskStatus::Active)
            .and_then(|due| {
                due.checked_sub_signed(self.lead).map(|fire_at| DueReminder {
                    task_id: task.id(),
                    fire_at,
                    due_date: due,
                })
            })
            .filter(|reminder| reminder.fire_at > now);
        let mut jobs = self.guard();
        match candidate {
            Some(reminder) => {
                debug!(task_id = %task.id(), fire_at = %reminder.fire_at, "due reminder scheduled");
                jobs.insert(task.id(), reminder);
                true
            }
            None => {
                jobs.remove(&task.id());
                false
            }
        }
    }

    /// Removes the reminder for `task_id`. Returns `true` when one existed.
    pub fn cancel(&self, task_id: TaskId) -> bool {
        let removed = self.guard().remove(&task_id).is_some();
        if removed {
            debug!(task_id = %task_id, "due reminder cancelled");
        }
        removed
    }

    /// Removes and returns every reminder whose fire time is at or before
    /// `now`, ordered by fire time.
    pub fn take_due(&self, now: DateTime<Utc>) -> Vec<DueReminder> {
        let mut jobs = self.guard();
        let due_ids: Vec<TaskId> = jobs
            .values()
            .filter(|reminder| reminder.fire_at <= now)
            .map(|reminder| reminder.task_id)
            .collect();
        let mut fired: Vec<DueReminder> = due_ids
            .into_iter()
            .filter_map(|task_id| jobs.remove(&task_id))
            .collect();
        fired.sort_by_key(|reminder| (reminder.fire_at, reminder.task_id));
        fired
    }

    /// Replaces the table with reminders for `tasks`. Returns how many were
    /// scheduled.
    pub fn rebuild(&self, tasks: &[Task], now: DateTime<Utc>) -> usize {
        self.guard().clear();
        tasks
            .iter()
            .filter(|task| self.schedule(task, now))
            .count()
    }

    /// Returns the pending reminder for `task_id`.
    #[must_use]
    pub fn get(&self, task_id: TaskId) -> Option<DueReminder> {
        self.guard().get(&task_id).copied()
    }

    /// Returns the number of pending reminders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.guard().len()
    }

    /// Returns `true` when nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }
}

impl Default for DueReminderJobs {
    fn default() -> Self {
        Self::new(Duration::hours(24))
    }
}
