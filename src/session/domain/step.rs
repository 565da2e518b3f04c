//! Wizard state tags.

use super::SessionDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wizard family a step or payload belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    /// New task wizard.
    Creation,
    /// Editing a persisted task.
    Edit,
    /// First-contact registration.
    Registration,
    /// Profile editing.
    Profile,
    /// Review report collection.
    Report,
    /// Comment entry.
    Comment,
}

impl Flow {
    /// Returns the canonical name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Creation => "creation",
            Self::Edit => "edit",
            Self::Registration => "registration",
            Self::Profile => "profile",
            Self::Report => "report",
            Self::Comment => "comment",
        }
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted state tag of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    /// Awaiting the task title.
    TaskTitle,
    /// Awaiting the description or skip.
    TaskDescription,
    /// Subtask loop menu.
    TaskSubtasks,
    /// Capturing one subtask title.
    TaskSubtaskInput,
    /// Attachment loop menu.
    TaskAttachments,
    /// Capturing one attachment.
    TaskAttachmentInput,
    /// Month grid of the calendar.
    CalendarDay,
    /// Time-of-day menu of the calendar.
    CalendarTime,
    /// Reminder interval menu.
    TaskNotificationInterval,
    /// Assignee kind menu.
    TaskAssignee,
    /// Paginated user picker.
    TaskAssigneeUser,
    /// Role picker.
    TaskAssigneeRole,
    /// "Are you sure?" gate of a cancelled creation.
    TaskCancelConfirm,
    /// Awaiting a new title.
    EditTitle,
    /// Awaiting a new description.
    EditDescription,
    /// Reminder interval menu for a persisted task.
    EditInterval,
    /// Assignee kind menu for a persisted task.
    EditAssignee,
    /// User picker for a persisted task.
    EditAssigneeUser,
    /// Role picker for a persisted task.
    EditAssigneeRole,
    /// Awaiting subtasks to append.
    EditAddSubtasks,
    /// Awaiting the first name during registration.
    RegistrationFirstName,
    /// Awaiting the last name during registration.
    RegistrationLastName,
    /// Awaiting a new first name.
    ProfileFirstName,
    /// Awaiting a new last name.
    ProfileLastName,
    /// Awaiting working hours as `H-H`.
    ProfileWorkHours,
    /// Awaiting an IANA timezone name.
    ProfileTimezone,
    /// Collecting a review report.
    TaskReport,
    /// Awaiting a comment.
    TaskComment,
}

impl WizardStep {
    const ALL: [Self; 28] = [
        Self::TaskTitle,
        Self::TaskDescription,
        Self::TaskSubtasks,
        Self::TaskSubtaskInput,
        Self::TaskAttachments,
        Self::TaskAttachmentInput,
        Self::CalendarDay,
        Self::CalendarTime,
        Self::TaskNotificationInterval,
        Self::TaskAssignee,
        Self::TaskAssigneeUser,
        Self::TaskAssigneeRole,
        Self::TaskCancelConfirm,
        Self::EditTitle,
        Self::EditDescription,
        Self::EditInterval,
        Self::EditAssignee,
        Self::EditAssigneeUser,
        Self::EditAssigneeRole,
        Self::EditAddSubtasks,
        Self::RegistrationFirstName,
        Self::RegistrationLastName,
        Self::ProfileFirstName,
        Self::ProfileLastName,
        Self::ProfileWorkHours,
        Self::ProfileTimezone,
        Self::TaskReport,
        Self::TaskComment,
    ];

    /// Returns the persisted tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TaskTitle => "task_title",
            Self::TaskDescription => "task_description",
            Self::TaskSubtasks => "task_subtasks",
            Self::TaskSubtaskInput => "task_subtask_input",
            Self::TaskAttachments => "task_attachments",
            Self::TaskAttachmentInput => "task_attachment_input",
            Self::CalendarDay => "calendar_day",
            Self::CalendarTime => "calendar_time",
            Self::TaskNotificationInterval => "task_notification_interval",
            Self::TaskAssignee => "task_assignee",
            Self::TaskAssigneeUser => "task_assignee_user",
            Self::TaskAssigneeRole => "task_assignee_role",
            Self::TaskCancelConfirm => "task_cancel_confirm",
            Self::EditTitle => "edit_title",
            Self::EditDescription => "edit_description",
            Self::EditInterval => "edit_interval",
            Self::EditAssignee => "edit_assignee",
            Self::EditAssigneeUser => "edit_assignee_user",
            Self::EditAssigneeRole => "edit_assignee_role",
            Self::EditAddSubtasks => "edit_add_subtasks",
            Self::RegistrationFirstName => "registration_first_name",
            Self::RegistrationLastName => "registration_last_name",
            Self::ProfileFirstName => "profile_first_name",
            Self::ProfileLastName => "profile_last_name",
            Self::ProfileWorkHours => "profile_work_hours",
            Self::ProfileTimezone => "profile_timezone",
            Self::TaskReport => "task_report",
            Self::TaskComment => "task_comment",
        }
    }

    /// Flows whose payload this step may carry.
    ///
    /// Calendar steps are shared by creation and editing; every other step
    /// belongs to exactly one flow.
    #[must_use]
    pub const fn flows(self) -> &'static [Flow] {
        match self {
            Self::TaskTitle
            | Self::TaskDescription
            | Self::TaskSubtasks
            | Self::TaskSubtaskInput
            | Self::TaskAttachments
            | Self::TaskAttachmentInput
            | Self::TaskNotificationInterval
            | Self::TaskAssignee
            | Self::TaskAssigneeUser
            | Self::TaskAssigneeRole
            | Self::TaskCancelConfirm => &[Flow::Creation],
            Self::CalendarDay | Self::CalendarTime => &[Flow::Creation, Flow::Edit],
            Self::EditTitle
            | Self::EditDescription
            | Self::EditInterval
            | Self::EditAssignee
            | Self::EditAssigneeUser
            | Self::EditAssigneeRole
            | Self::EditAddSubtasks => &[Flow::Edit],
            Self::RegistrationFirstName | Self::RegistrationLastName => &[Flow::Registration],
            Self::ProfileFirstName
            | Self::ProfileLastName
            | Self::ProfileWorkHours
            | Self::ProfileTimezone => &[Flow::Profile],
            Self::TaskReport => &[Flow::Report],
            Self::TaskComment => &[Flow::Comment],
        }
    }

    /// Returns `true` for the calendar sub-machine.
    #[must_use]
    pub const fn is_calendar(self) -> bool {
        matches!(self, Self::CalendarDay | Self::CalendarTime)
    }
}

impl TryFrom<&str> for WizardStep {
    type Error = SessionDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|step| step.as_str() == trimmed)
            .ok_or_else(|| SessionDomainError::UnknownStep(value.to_owned()))
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
