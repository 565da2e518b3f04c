//! Closed command table carried by inline buttons.
//!
//! A command travels through the transport as `verb[:arg[:arg]]`. Verbs are
//! matched exactly, so no verb can shadow another that shares its prefix.

use crate::directory::domain::{RoleId, UserId};
use crate::session::domain::EditField;
use crate::task::domain::{NotificationInterval, SubtaskId, TaskId};
use chrono::{NaiveDate, NaiveTime};
use std::fmt;
use thiserror::Error;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

/// Profile attribute edited through the profile wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileField {
    /// First name.
    FirstName,
    /// Last name.
    LastName,
    /// Working-hours window.
    WorkHours,
    /// IANA timezone.
    Timezone,
}

impl ProfileField {
    /// Returns the canonical name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::WorkHours => "work_hours",
            Self::Timezone => "timezone",
        }
    }

    /// Parses a canonical name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "first_name" => Some(Self::FirstName),
            "last_name" => Some(Self::LastName),
            "work_hours" => Some(Self::WorkHours),
            "timezone" => Some(Self::Timezone),
            _ => None,
        }
    }
}

/// Every action a button can request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// First contact or explicit restart.
    Start,
    /// Main menu.
    MainMenu,
    /// Tasks the caller is responsible for.
    MyTasks,
    /// Tasks the caller created.
    CreatedTasks,
    /// Profile card.
    Profile,
    /// Start the creation wizard.
    CreateTask,
    /// Task card.
    ViewTask(TaskId),
    /// Complete directly or start the report wizard.
    CompleteTask(TaskId),
    /// Accept a submitted report.
    ConfirmTask(TaskId),
    /// Send a submitted report back.
    RejectTask(TaskId),
    /// Reopen a completed task.
    ReopenTask(TaskId),
    /// Cancel an open task.
    CancelTask(TaskId),
    /// Ask for deletion confirmation.
    DeleteTask(TaskId),
    /// Delete after confirmation.
    ConfirmDelete(TaskId),
    /// Flip one subtask.
    ToggleSubtask(TaskId, SubtaskId),
    /// Subtask checklist.
    ShowSubtasks(TaskId),
    /// Start the comment wizard.
    CommentTask(TaskId),
    /// Comment thread.
    ShowComments(TaskId),
    /// Audit trail.
    ShowHistory(TaskId),
    /// Edit menu of a task.
    EditTask(TaskId),
    /// Start editing one field.
    EditField(TaskId, EditField),
    /// Previous wizard step.
    Back,
    /// Abandon the wizard.
    Cancel,
    /// Confirm abandoning the creation wizard.
    CancelConfirm,
    /// Keep the creation wizard.
    CancelDecline,
    /// Skip an optional step.
    Skip,
    /// Leave a loop menu.
    Next,
    /// Enter one subtask.
    AddSubtask,
    /// Drop all entered subtasks.
    ClearSubtasks,
    /// Attach one file.
    AddAttachment,
    /// Drop all attachments.
    ClearAttachments,
    /// Previous calendar month.
    CalendarPrev,
    /// Next calendar month.
    CalendarNext,
    /// Pick a calendar day.
    CalendarDay(NaiveDate),
    /// No due date.
    CalendarNoDate,
    /// Pick a time slot.
    CalendarTime(NaiveTime),
    /// End of the picked day.
    CalendarNoTime,
    /// Pick a reminder interval.
    Interval(NotificationInterval),
    /// No reminder interval.
    NoInterval,
    /// Assign to the caller.
    AssignSelf,
    /// Open the user picker.
    AssignUserMenu,
    /// Page of the user picker.
    AssigneePage(usize),
    /// Assign to a user.
    AssignUser(UserId),
    /// Open the role picker.
    AssignRoleMenu,
    /// Assign to a role.
    AssignRole(RoleId),
    /// Submit the collected report.
    SendReport,
    /// Edit one profile attribute.
    EditProfile(ProfileField),
    /// Finish or skip the tutorial.
    TutorialDone,
    /// Inert button, such as a calendar header.
    Noop,
}

/// Failure to decode a command string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommandError {
    /// The verb is not in the command table.
    #[error("unknown command '{0}'")]
    UnknownVerb(String),

    /// The verb needs an argument that is absent.
    #[error("command '{verb}' is missing an argument")]
    MissingArgument {
        /// Verb as received.
        verb: String,
    },

    /// An argument failed to parse, or an extra one was supplied.
    #[error("invalid argument '{value}' for command '{verb}'")]
    InvalidArgument {
        /// Verb as received.
        verb: String,
        /// Offending argument text.
        value: String,
    },
}

struct Args<'a> {
    verb: &'a str,
    rest: Option<&'a str>,
}

impl<'a> Args<'a> {
    fn invalid(&self, value: &str) -> CommandError {
        CommandError::InvalidArgument {
            verb: self.verb.to_owned(),
            value: value.to_owned(),
        }
    }

    fn none(&self) -> Result<(), CommandError> {
        self.rest.map_or(Ok(()), |extra| Err(self.invalid(extra)))
    }

    fn one(&self) -> Result<&'a str, CommandError> {
        self.rest
            .filter(|value| !value.is_empty())
            .ok_or_else(|| CommandError::MissingArgument {
                verb: self.verb.to_owned(),
            })
    }

    fn two(&self) -> Result<(&'a str, &'a str), CommandError> {
        let raw = self.one()?;
        raw.split_once(':').ok_or_else(|| CommandError::MissingArgument {
            verb: self.verb.to_owned(),
        })
    }

    fn number(&self, raw: &str) -> Result<i64, CommandError> {
        raw.parse::<i64>().map_err(|_| self.invalid(raw))
    }

    fn task(&self, raw: &str) -> Result<TaskId, CommandError> {
        TaskId::new(self.number(raw)?).map_err(|_| self.invalid(raw))
    }

    fn task_only(&self) -> Result<TaskId, CommandError> {
        self.task(self.one()?)
    }
}

impl Command {
    /// Decodes a transport command string.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] for unknown verbs, missing arguments, and
    /// arguments that do not parse.
    pub fn decode(raw: &str) -> Result<Self, CommandError> {
        let trimmed = raw.trim();
        let (verb, rest) = trimmed
            .split_once(':')
            .map_or((trimmed, None), |(head, tail)| (head, Some(tail)));
        let args = Args { verb, rest };
        match verb {
            "start" | "menu" | "my_tasks" | "created_tasks" | "profile" | "create_task" => {
                args.none()?;
                Ok(Self::navigation(verb))
            }
            "view" => Ok(Self::ViewTask(args.task_only()?)),
            "complete" => Ok(Self::CompleteTask(args.task_only()?)),
            "confirm" => Ok(Self::ConfirmTask(args.task_only()?)),
            "reject" => Ok(Self::RejectTask(args.task_only()?)),
            "reopen" => Ok(Self::ReopenTask(args.task_only()?)),
            "cancel_task" => Ok(Self::CancelTask(args.task_only()?)),
            "delete" => Ok(Self::DeleteTask(args.task_only()?)),
            "delete_yes" => Ok(Self::ConfirmDelete(args.task_only()?)),
            "subtasks" => Ok(Self::ShowSubtasks(args.task_only()?)),
            "comment" => Ok(Self::CommentTask(args.task_only()?)),
            "comments" => Ok(Self::ShowComments(args.task_only()?)),
            "history" => Ok(Self::ShowHistory(args.task_only()?)),
            "edit" => Ok(Self::EditTask(args.task_only()?)),
            "toggle" => {
                let (task, subtask) = args.two()?;
                let subtask_id =
                    SubtaskId::new(args.number(subtask)?).map_err(|_| args.invalid(subtask))?;
                Ok(Self::ToggleSubtask(args.task(task)?, subtask_id))
            }
            "edit_field" => {
                let (task, field) = args.two()?;
                let parsed = EditField::parse(field).ok_or_else(|| args.invalid(field))?;
                Ok(Self::EditField(args.task(task)?, parsed))
            }
            _ => Self::decode_wizard(&args),
        }
    }

    fn navigation(verb: &str) -> Self {
        match verb {
            "start" => Self::Start,
            "my_tasks" => Self::MyTasks,
            "created_tasks" => Self::CreatedTasks,
            "profile" => Self::Profile,
            "create_task" => Self::CreateTask,
            _ => Self::MainMenu,
        }
    }

    fn decode_wizard(args: &Args<'_>) -> Result<Self, CommandError> {
        let bare = match args.verb {
            "back" => Some(Self::Back),
            "cancel" => Some(Self::Cancel),
            "cancel_yes" => Some(Self::CancelConfirm),
            "cancel_no" => Some(Self::CancelDecline),
            "skip" => Some(Self::Skip),
            "next" => Some(Self::Next),
            "add_subtask" => Some(Self::AddSubtask),
            "clear_subtasks" => Some(Self::ClearSubtasks),
            "add_attachment" => Some(Self::AddAttachment),
            "clear_attachments" => Some(Self::ClearAttachments),
            "cal_prev" => Some(Self::CalendarPrev),
            "cal_next" => Some(Self::CalendarNext),
            "cal_none" => Some(Self::CalendarNoDate),
            "time_none" => Some(Self::CalendarNoTime),
            "interval_none" => Some(Self::NoInterval),
            "assign_self" => Some(Self::AssignSelf),
            "assign_user_menu" => Some(Self::AssignUserMenu),
            "assign_role_menu" => Some(Self::AssignRoleMenu),
            "send_report" => Some(Self::SendReport),
            "tutorial_done" => Some(Self::TutorialDone),
            "noop" => Some(Self::Noop),
            _ => None,
        };
        if let Some(command) = bare {
            args.none()?;
            return Ok(command);
        }
        Self::decode_with_argument(args)
    }

    fn decode_with_argument(args: &Args<'_>) -> Result<Self, CommandError> {
        match args.verb {
            "cal_day" => {
                let raw = args.one()?;
                NaiveDate::parse_from_str(raw, DATE_FORMAT)
                    .map(Self::CalendarDay)
                    .map_err(|_| args.invalid(raw))
            }
            "time" => {
                let raw = args.one()?;
                NaiveTime::parse_from_str(raw, TIME_FORMAT)
                    .map(Self::CalendarTime)
                    .map_err(|_| args.invalid(raw))
            }
            "interval" => {
                let raw = args.one()?;
                raw.parse::<u32>()
                    .ok()
                    .and_then(|minutes| NotificationInterval::from_minutes(minutes).ok())
                    .map(Self::Interval)
                    .ok_or_else(|| args.invalid(raw))
            }
            "assign_page" => {
                let raw = args.one()?;
                raw.parse::<usize>()
                    .map(Self::AssigneePage)
                    .map_err(|_| args.invalid(raw))
            }
            "assign_user" => {
                let raw = args.one()?;
                UserId::new(raw)
                    .map(Self::AssignUser)
                    .map_err(|_| args.invalid(raw))
            }
            "assign_role" => {
                let raw = args.one()?;
                RoleId::new(args.number(raw)?)
                    .map(Self::AssignRole)
                    .map_err(|_| args.invalid(raw))
            }
            "profile_edit" => {
                let raw = args.one()?;
                ProfileField::parse(raw)
                    .map(Self::EditProfile)
                    .ok_or_else(|| args.invalid(raw))
            }
            other => Err(CommandError::UnknownVerb(other.to_owned())),
        }
    }

    /// Encodes the command for a button.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::ViewTask(id) => format!("view:{id}"),
            Self::CompleteTask(id) => format!("complete:{id}"),
            Self::ConfirmTask(id) => format!("confirm:{id}"),
            Self::RejectTask(id) => format!("reject:{id}"),
            Self::ReopenTask(id) => format!("reopen:{id}"),
            Self::CancelTask(id) => format!("cancel_task:{id}"),
            Self::DeleteTask(id) => format!("delete:{id}"),
            Self::ConfirmDelete(id) => format!("delete_yes:{id}"),
            Self::ToggleSubtask(task, subtask) => format!("toggle:{task}:{subtask}"),
            Self::ShowSubtasks(id) => format!("subtasks:{id}"),
            Self::CommentTask(id) => format!("comment:{id}"),
            Self::ShowComments(id) => format!("comments:{id}"),
            Self::ShowHistory(id) => format!("history:{id}"),
            Self::EditTask(id) => format!("edit:{id}"),
            Self::EditField(id, field) => format!("edit_field:{id}:{field}"),
            Self::CalendarDay(day) => format!("cal_day:{}", day.format(DATE_FORMAT)),
            Self::CalendarTime(time) => format!("time:{}", time.format(TIME_FORMAT)),
            Self::Interval(interval) => format!("interval:{}", interval.minutes()),
            Self::AssigneePage(page) => format!("assign_page:{page}"),
            Self::AssignUser(user) => format!("assign_user:{user}"),
            Self::AssignRole(role) => format!("assign_role:{role}"),
            Self::EditProfile(field) => format!("profile_edit:{}", field.as_str()),
            bare => bare.verb().to_owned(),
        }
    }

    /// Returns the verb of the command.
    #[must_use]
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::MainMenu => "menu",
            Self::MyTasks => "my_tasks",
            Self::CreatedTasks => "created_tasks",
            Self::Profile => "profile",
            Self::CreateTask => "create_task",
            Self::ViewTask(_) => "view",
            Self::CompleteTask(_) => "complete",
            Self::ConfirmTask(_) => "confirm",
            Self::RejectTask(_) => "reject",
            Self::ReopenTask(_) => "reopen",
            Self::CancelTask(_) => "cancel_task",
            Self::DeleteTask(_) => "delete",
            Self::ConfirmDelete(_) => "delete_yes",
            Self::ToggleSubtask(..) => "toggle",
            Self::ShowSubtasks(_) => "subtasks",
            Self::CommentTask(_) => "comment",
            Self::ShowComments(_) => "comments",
            Self::ShowHistory(_) => "history",
            Self::EditTask(_) => "edit",
            Self::EditField(..) => "edit_field",
            Self::Back => "back",
            Self::Cancel => "cancel",
            Self::CancelConfirm => "cancel_yes",
            Self::CancelDecline => "cancel_no",
            Self::Skip => "skip",
            Self::Next => "next",
            Self::AddSubtask => "add_subtask",
            Self::ClearSubtasks => "clear_subtasks",
            Self::AddAttachment => "add_attachment",
            Self::ClearAttachments => "clear_attachments",
            Self::CalendarPrev => "cal_prev",
            Self::CalendarNext => "cal_next",
            Self::CalendarDay(_) => "cal_day",
            Self::CalendarNoDate => "cal_none",
            Self::CalendarTime(_) => "time",
            Self::CalendarNoTime => "time_none",
            Self::Interval(_) => "interval",
            Self::NoInterval => "interval_none",
            Self::AssignSelf => "assign_self",
            Self::AssignUserMenu => "assign_user_menu",
            Self::AssigneePage(_) => "assign_page",
            Self::AssignUser(_) => "assign_user",
            Self::AssignRoleMenu => "assign_role_menu",
            Self::AssignRole(_) => "assign_role",
            Self::SendReport => "send_report",
            Self::EditProfile(_) => "profile_edit",
            Self::TutorialDone => "tutorial_done",
            Self::Noop => "noop",
        }
    }

    /// Returns `true` for menu navigation, which abandons any active wizard.
    #[must_use]
    pub const fn is_navigation(&self) -> bool {
        matches!(
            self,
            Self::Start
                | Self::MainMenu
                | Self::MyTasks
                | Self::CreatedTasks
                | Self::Profile
                | Self::CreateTask
        )
    }

    /// Maps a typed slash command such as `/start` to its button equivalent.
    #[must_use]
    pub fn from_slash(text: &str) -> Option<Self> {
        let word = text.split_whitespace().next()?.strip_prefix('/')?;
        let name = word.split_once('@').map_or(word, |(head, _)| head);
        match name {
            "start" => Some(Self::Start),
            "menu" => Some(Self::MainMenu),
            "tasks" => Some(Self::MyTasks),
            "created" => Some(Self::CreatedTasks),
            "profile" => Some(Self::Profile),
            "new" => Some(Self::CreateTask),
            "cancel" => Some(Self::Cancel),
            _ => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
