//! Typed session payloads, one variant per wizard.

use super::{Flow, WizardStep};
use crate::task::domain::{BlobRef, NotificationInterval, TaskId};
use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the calendar delivers the chosen instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target", content = "task_id", rename_all = "snake_case")]
pub enum CalendarReturn {
    /// Store the date in the creation draft and continue the wizard.
    ResumeCreation,
    /// Write the date to the persisted task.
    ResumeEdit(TaskId),
}

/// Calendar sub-machine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarCursor {
    /// Displayed year.
    pub year: i32,
    /// Displayed month, 1 to 12.
    pub month: u32,
    /// Day picked on the grid, awaiting a time.
    pub selected_date: Option<NaiveDate>,
    /// Return address of the sub-machine.
    pub return_to: CalendarReturn,
}

impl CalendarCursor {
    /// Opens the calendar on the month containing `today`.
    #[must_use]
    pub fn open(today: NaiveDate, return_to: CalendarReturn) -> Self {
        Self {
            year: today.year(),
            month: today.month(),
            selected_date: None,
            return_to,
        }
    }

    /// First day of the displayed month.
    #[must_use]
    pub fn first_of_month(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// Cursor moved by one month forwards or backwards.
    ///
    /// Returns `None` when the result falls outside the supported range.
    #[must_use]
    pub fn shifted(&self, forward: bool) -> Option<Self> {
        let first = self.first_of_month()?;
        let target = if forward {
            first.checked_add_months(Months::new(1))?
        } else {
            first.checked_sub_months(Months::new(1))?
        };
        Some(Self {
            year: target.year(),
            month: target.month(),
            selected_date: None,
            return_to: self.return_to,
        })
    }
}

/// Task creation draft accumulated across wizard steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreationDraft {
    /// Validated title.
    pub title: Option<String>,
    /// Description; absent when skipped.
    pub description: Option<String>,
    /// Subtask titles in entry order.
    pub subtasks: Vec<String>,
    /// Attachments in entry order.
    pub attachments: Vec<BlobRef>,
    /// Chosen due instant.
    pub due_date: Option<DateTime<Utc>>,
    /// Chosen reminder interval.
    pub notification_interval: Option<NotificationInterval>,
    /// Current page of the user picker.
    pub assignee_page: usize,
    /// Open calendar, while choosing the due date.
    pub calendar: Option<CalendarCursor>,
    /// Step to resume when a cancellation is declined.
    pub resume_step: Option<WizardStep>,
}

/// Field of a persisted task being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditField {
    /// Title.
    Title,
    /// Description.
    Description,
    /// Due date.
    DueDate,
    /// Reminder interval.
    Interval,
    /// Assignee or role.
    Assignee,
    /// Appended subtasks.
    Subtasks,
}

impl EditField {
    /// Returns the canonical name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::DueDate => "due_date",
            Self::Interval => "interval",
            Self::Assignee => "assignee",
            Self::Subtasks => "subtasks",
        }
    }

    /// Parses a canonical name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "title" => Some(Self::Title),
            "description" => Some(Self::Description),
            "due_date" => Some(Self::DueDate),
            "interval" => Some(Self::Interval),
            "assignee" => Some(Self::Assignee),
            "subtasks" => Some(Self::Subtasks),
            _ => None,
        }
    }
}

impl fmt::Display for EditField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Editing session targeting a persisted task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditSession {
    /// Task being edited.
    pub task_id: TaskId,
    /// Field being edited.
    pub field: EditField,
    /// Open calendar, while editing the due date.
    pub calendar: Option<CalendarCursor>,
    /// Current page of the user picker.
    pub assignee_page: usize,
}

impl EditSession {
    /// Starts editing `field` of `task_id`.
    #[must_use]
    pub const fn new(task_id: TaskId, field: EditField) -> Self {
        Self {
            task_id,
            field,
            calendar: None,
            assignee_page: 0,
        }
    }
}

/// Wizard payload selected by the session's step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "flow", rename_all = "snake_case")]
pub enum SessionPayload {
    /// New task draft.
    Creation(CreationDraft),
    /// Edit of a persisted task.
    Edit(EditSession),
    /// Registration in progress.
    Registration {
        /// First name, once entered.
        first_name: Option<String>,
    },
    /// Profile editing; every answer is written immediately.
    Profile,
    /// Review report collection.
    Report {
        /// Task being reported on.
        task_id: TaskId,
        /// Attachments collected so far.
        attachments: Vec<BlobRef>,
    },
    /// Comment entry.
    Comment {
        /// Task being commented on.
        task_id: TaskId,
    },
}

impl SessionPayload {
    /// Flow this payload belongs to.
    #[must_use]
    pub const fn flow(&self) -> Flow {
        match self {
            Self::Creation(_) => Flow::Creation,
            Self::Edit(_) => Flow::Edit,
            Self::Registration { .. } => Flow::Registration,
            Self::Profile => Flow::Profile,
            Self::Report { .. } => Flow::Report,
            Self::Comment { .. } => Flow::Comment,
        }
    }

    /// Open calendar cursor, if any.
    #[must_use]
    pub const fn calendar(&self) -> Option<&CalendarCursor> {
        match self {
            Self::Creation(draft) => draft.calendar.as_ref(),
            Self::Edit(edit) => edit.calendar.as_ref(),
            Self::Registration { .. } | Self::Profile | Self::Report { .. } | Self::Comment { .. } => {
                None
            }
        }
    }
}
