//! Screens shown to the user: menus, task cards, and wizard prompts.

use super::command::{Command, ProfileField};
use crate::directory::domain::{Role, User};
use crate::notification::domain::{Button, MessageKind, OutboundMessage};
use crate::session::domain::{CalendarCursor, CreationDraft, EditField};
use crate::task::domain::{BlobRef, NotificationInterval, Task, TaskComment, TaskHistoryEntry, TaskStatus};
use crate::task::services::{DeletePolicy, has_access};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;

const LOCAL_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Button carrying `command`.
#[must_use]
pub fn button(label: impl Into<String>, command: &Command) -> Button {
    Button::new(label, command.encode())
}

fn back_cancel_row() -> Vec<Button> {
    vec![
        button("« Back", &Command::Back),
        button("✖ Cancel", &Command::Cancel),
    ]
}

/// Formats an instant in the viewer's timezone.
#[must_use]
pub fn local(instant: DateTime<Utc>, tz: Tz) -> String {
    instant.with_timezone(&tz).format(LOCAL_FORMAT).to_string()
}

/// Reply with no buttons.
#[must_use]
pub fn notice(kind: MessageKind, text: impl Into<String>) -> OutboundMessage {
    OutboundMessage::new(kind, text)
}

/// Main menu.
#[must_use]
pub fn main_menu(user: &User) -> OutboundMessage {
    OutboundMessage::new(
        MessageKind::Menu,
        format!("Hi {}! What would you like to do?", user.display_name()),
    )
    .with_button(button("➕ New task", &Command::CreateTask))
    .with_row(vec![
        button("📋 My tasks", &Command::MyTasks),
        button("📤 Created by me", &Command::CreatedTasks),
    ])
    .with_button(button("👤 Profile", &Command::Profile))
}

/// List of tasks, one button per task.
#[must_use]
pub fn task_list(heading: &str, tasks: &[Task], now: DateTime<Utc>) -> OutboundMessage {
    let text = if tasks.is_empty() {
        format!("{heading}\n\nNothing here yet.")
    } else {
        format!("{heading} ({})", tasks.len())
    };
    tasks
        .iter()
        .fold(OutboundMessage::new(MessageKind::TaskView, text), |message, task| {
            let marker = match task.status() {
                TaskStatus::PendingReview => "⏳",
                _ if task.is_overdue(now) => "⚠️",
                TaskStatus::Active => "•",
                TaskStatus::Completed => "✔",
                TaskStatus::Cancelled => "✖",
            };
            let progress = task
                .progress()
                .map_or_else(String::new, |value| format!(" [{value}]"));
            message.with_button(button(
                format!("{marker} {}{progress}", task.title()),
                &Command::ViewTask(task.id()),
            ))
        })
        .with_button(button("« Menu", &Command::MainMenu))
}

/// Inputs of a task card besides the task itself.
#[derive(Debug, Clone, Copy)]
pub struct CardContext<'a> {
    /// Viewer; decides which actions are offered.
    pub viewer: &'a User,
    /// Human-readable assignee or role name.
    pub assignee_label: &'a str,
    /// Current instant.
    pub now: DateTime<Utc>,
    /// Deletion policy in force.
    pub delete_policy: DeletePolicy,
}

/// Task card with the actions available to the viewer.
#[must_use]
pub fn task_card(task: &Task, context: CardContext<'_>) -> OutboundMessage {
    let tz = context.viewer.timezone().tz();
    let mut text = format!("📌 {}\nStatus: {}", task.title(), task.status());
    if let Some(description) = task.description() {
        text.push_str(&format!("\n\n{description}"));
    }
    text.push_str(&format!("\n\nAssigned to: {}", context.assignee_label));
    if let Some(due) = task.due_date() {
        let overdue = if task.is_overdue(context.now) { " (overdue)" } else { "" };
        text.push_str(&format!("\nDue: {}{overdue}", local(due, tz)));
    }
    if let Some(interval) = task.notification_interval() {
        text.push_str(&format!("\nReminders: every {}", interval_label(interval.minutes())));
    }
    if let Some(progress) = task.progress() {
        text.push_str(&format!("\nSubtasks: {progress}"));
    }
    if !task.attachments().is_empty() {
        text.push_str(&format!("\nAttachments: {}", task.attachments().len()));
    }
    if task.status() == TaskStatus::PendingReview {
        let report = task.report_text().unwrap_or("(attachments only)");
        text.push_str(&format!(
            "\n\nReport: {report}\nReport attachments: {}",
            task.report_attachments().len()
        ));
    }
    card_buttons(task, &context).into_iter().fold(
        OutboundMessage::new(MessageKind::TaskView, text),
        OutboundMessage::with_row,
    )
}

fn card_buttons(task: &Task, context: &CardContext<'_>) -> Vec<Vec<Button>> {
    let viewer = context.viewer;
    let id = task.id();
    let is_creator = task.creator() == viewer.id() || viewer.is_admin();
    let participant = has_access(task, viewer) || viewer.is_admin();
    let mut rows = Vec::new();
    match task.status() {
        TaskStatus::Active if is_creator && task.is_self_assigned() => {
            rows.push(vec![button("✅ Done", &Command::CompleteTask(id))]);
        }
        TaskStatus::Active if participant && task.creator() != viewer.id() => {
            rows.push(vec![button("📝 Submit report", &Command::CompleteTask(id))]);
        }
        TaskStatus::PendingReview if is_creator => rows.push(vec![
            button("✅ Confirm", &Command::ConfirmTask(id)),
            button("↩ Reject", &Command::RejectTask(id)),
        ]),
        TaskStatus::Completed if is_creator => {
            rows.push(vec![button("🔄 Reopen", &Command::ReopenTask(id))]);
        }
        _ => {}
    }
    if !task.subtasks().is_empty() {
        rows.push(vec![button("☑ Subtasks", &Command::ShowSubtasks(id))]);
    }
    if is_creator && task.status().is_open() {
        rows.push(vec![
            button("✏ Edit", &Command::EditTask(id)),
            button("🚫 Cancel task", &Command::CancelTask(id)),
        ]);
    }
    rows.push(vec![
        button("💬 Comment", &Command::CommentTask(id)),
        button("🗨 Comments", &Command::ShowComments(id)),
        button("📜 History", &Command::ShowHistory(id)),
    ]);
    let may_delete = match context.delete_policy {
        DeletePolicy::CreatorOnly => is_creator,
        DeletePolicy::CreatorOrResponsible => participant,
    };
    if may_delete {
        rows.push(vec![button("🗑 Delete", &Command::DeleteTask(id))]);
    }
    rows.push(vec![button("« Menu", &Command::MainMenu)]);
    rows
}

/// Subtask checklist with one toggle per subtask.
#[must_use]
pub fn subtask_checklist(task: &Task) -> OutboundMessage {
    let progress = task
        .progress()
        .map_or_else(|| "none".to_owned(), |value| value.to_string());
    task.subtasks()
        .iter()
        .fold(
            OutboundMessage::new(
                MessageKind::TaskView,
                format!("Subtasks of \"{}\": {progress}", task.title()),
            ),
            |message, subtask| {
                let mark = if subtask.is_completed() { "☑" } else { "☐" };
                message.with_button(button(
                    format!("{mark} {}", subtask.title()),
                    &Command::ToggleSubtask(task.id(), subtask.id()),
                ))
            },
        )
        .with_button(button("« Back to task", &Command::ViewTask(task.id())))
}

/// Audit trail of a task.
#[must_use]
pub fn history_view(task: &Task, entries: &[TaskHistoryEntry], tz: Tz) -> OutboundMessage {
    let mut text = format!("History of \"{}\"", task.title());
    for entry in entries {
        text.push_str(&format!(
            "\n{} {}: {}",
            local(entry.created_at, tz),
            entry.actor,
            entry.action.as_str().replace('_', " ")
        ));
        match (entry.old_value.as_deref(), entry.new_value.as_deref()) {
            (Some(old), Some(new)) => {
                text.push_str(&format!(" ({old} → {new})"));
            }
            (None, Some(value)) | (Some(value), None) => {
                text.push_str(&format!(" ({value})"));
            }
            (None, None) => {}
        }
    }
    OutboundMessage::new(MessageKind::TaskView, text)
        .with_button(button("« Back to task", &Command::ViewTask(task.id())))
}

/// Comment thread of a task.
#[must_use]
pub fn comments_view(task: &Task, comments: &[TaskComment], tz: Tz) -> OutboundMessage {
    let mut text = format!("Comments on \"{}\"", task.title());
    if comments.is_empty() {
        text.push_str("\n\nNo comments yet.");
    }
    for comment in comments {
        text.push_str(&format!(
            "\n\n{} {}:\n{}",
            local(comment.created_at, tz),
            comment.author,
            comment.text
        ));
    }
    OutboundMessage::new(MessageKind::TaskView, text)
        .with_button(button("💬 Comment", &Command::CommentTask(task.id())))
        .with_button(button("« Back to task", &Command::ViewTask(task.id())))
}

/// Edit menu of a task.
#[must_use]
pub fn edit_menu(task: &Task) -> OutboundMessage {
    let field = |label: &str, value: EditField| button(label, &Command::EditField(task.id(), value));
    OutboundMessage::new(
        MessageKind::Menu,
        format!("What should change in \"{}\"?", task.title()),
    )
    .with_row(vec![
        field("Title", EditField::Title),
        field("Description", EditField::Description),
    ])
    .with_row(vec![
        field("Due date", EditField::DueDate),
        field("Reminders", EditField::Interval),
    ])
    .with_row(vec![
        field("Assignee", EditField::Assignee),
        field("Add subtasks", EditField::Subtasks),
    ])
    .with_button(button("« Back to task", &Command::ViewTask(task.id())))
}

/// Deletion confirmation.
#[must_use]
pub fn delete_gate(task: &Task) -> OutboundMessage {
    OutboundMessage::new(
        MessageKind::Prompt,
        format!(
            "Delete \"{}\" with its subtasks, comments, and history? This cannot be undone.",
            task.title()
        ),
    )
    .with_row(vec![
        button("🗑 Delete", &Command::ConfirmDelete(task.id())),
        button("Keep", &Command::ViewTask(task.id())),
    ])
}

/// Profile card.
#[must_use]
pub fn profile_card(user: &User) -> OutboundMessage {
    let field = |label: &str, value: ProfileField| button(label, &Command::EditProfile(value));
    let text = format!(
        "👤 {}\nFirst name: {}\nLast name: {}\nWorking hours: {}\nTimezone: {}",
        user.display_name(),
        user.first_name().unwrap_or("-"),
        user.last_name().unwrap_or("-"),
        user.work_hours(),
        user.timezone()
    );
    let card = OutboundMessage::new(MessageKind::Menu, text)
        .with_row(vec![
            field("First name", ProfileField::FirstName),
            field("Last name", ProfileField::LastName),
        ])
        .with_row(vec![
            field("Working hours", ProfileField::WorkHours),
            field("Timezone", ProfileField::Timezone),
        ]);
    if user.tutorial_finished() {
        card.with_button(button("« Menu", &Command::MainMenu))
    } else {
        card.with_row(vec![
            button("Skip tutorial", &Command::TutorialDone),
            button("« Menu", &Command::MainMenu),
        ])
    }
}

/// Onboarding hint shown after registration.
#[must_use]
pub fn tutorial() -> OutboundMessage {
    OutboundMessage::new(
        MessageKind::Info,
        "Create a task with \"New task\", assign it to yourself, a colleague, or a whole \
         role, and pick a due date. Assignees submit a report when done and you confirm \
         or reject it. Set your working hours and timezone in your profile so reminders \
         arrive at sensible times.",
    )
    .with_button(button("Got it", &Command::TutorialDone))
}

/// Free-text prompt with optional skip.
#[must_use]
pub fn text_prompt(text: impl Into<String>, skippable: bool) -> OutboundMessage {
    let message = OutboundMessage::new(MessageKind::Prompt, text);
    let with_skip = if skippable {
        message.with_button(button("Skip", &Command::Skip))
    } else {
        message
    };
    with_skip.with_row(back_cancel_row())
}

/// Prompt for the first creation step.
#[must_use]
pub fn title_prompt(min_chars: usize) -> OutboundMessage {
    OutboundMessage::new(
        MessageKind::Prompt,
        format!("What is the task? Send a title of at least {min_chars} characters."),
    )
    .with_button(button("✖ Cancel", &Command::Cancel))
}

/// Subtask loop menu of the creation wizard.
#[must_use]
pub fn subtask_loop(draft: &CreationDraft) -> OutboundMessage {
    let listing = if draft.subtasks.is_empty() {
        "No subtasks yet.".to_owned()
    } else {
        numbered(draft.subtasks.iter().map(String::as_str))
    };
    let mut actions = vec![button("➕ Add subtask", &Command::AddSubtask)];
    if !draft.subtasks.is_empty() {
        actions.push(button("🧹 Clear all", &Command::ClearSubtasks));
    }
    OutboundMessage::new(MessageKind::Prompt, format!("Subtasks\n\n{listing}"))
        .with_row(actions)
        .with_button(button("Next »", &Command::Next))
        .with_row(back_cancel_row())
}

/// Attachment loop menu of the creation wizard.
#[must_use]
pub fn attachment_loop(attachments: &[BlobRef]) -> OutboundMessage {
    let listing = if attachments.is_empty() {
        "No attachments yet.".to_owned()
    } else {
        numbered(
            attachments
                .iter()
                .map(|blob| blob.filename().unwrap_or_else(|| blob.kind().as_str())),
        )
    };
    let mut actions = vec![button("📎 Attach file", &Command::AddAttachment)];
    if !attachments.is_empty() {
        actions.push(button("🧹 Clear all", &Command::ClearAttachments));
    }
    OutboundMessage::new(MessageKind::Prompt, format!("Attachments\n\n{listing}"))
        .with_row(actions)
        .with_button(button("Next »", &Command::Next))
        .with_row(back_cancel_row())
}

fn numbered<'a>(items: impl Iterator<Item = &'a str>) -> String {
    items
        .enumerate()
        .map(|(index, item)| format!("{}. {item}", index.saturating_add(1)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Month grid with navigation.
#[must_use]
pub fn calendar_view(
    cursor: &CalendarCursor,
    weeks: &[Vec<Option<NaiveDate>>],
    today: NaiveDate,
) -> OutboundMessage {
    let heading = cursor
        .first_of_month()
        .map_or_else(String::new, |first| first.format("%B %Y").to_string());
    let weekdays = ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"]
        .into_iter()
        .map(|day| button(day, &Command::Noop))
        .collect();
    let grid = weeks.iter().map(|week| {
        week.iter()
            .map(|cell| match cell {
                Some(day) if *day < today => button("·", &Command::CalendarDay(*day)),
                Some(day) => button(day.format("%-d").to_string(), &Command::CalendarDay(*day)),
                None => button(" ", &Command::Noop),
            })
            .collect::<Vec<_>>()
    });
    let message = OutboundMessage::new(MessageKind::Prompt, "Pick a due date")
        .with_row(vec![
            button("‹", &Command::CalendarPrev),
            button(heading, &Command::Noop),
            button("›", &Command::CalendarNext),
        ])
        .with_row(weekdays);
    grid.fold(message, OutboundMessage::with_row)
        .with_button(button("No due date", &Command::CalendarNoDate))
        .with_row(back_cancel_row())
}

/// Time-of-day menu for a picked day.
#[must_use]
pub fn time_view(day: NaiveDate, slots: &[NaiveTime]) -> OutboundMessage {
    let text = if slots.is_empty() {
        format!("{}: no time slots left today", day.format("%a %Y-%m-%d"))
    } else {
        format!("{}: pick a time", day.format("%a %Y-%m-%d"))
    };
    slots
        .chunks(4)
        .map(|row| {
            row.iter()
                .map(|slot| button(slot.format("%H:%M").to_string(), &Command::CalendarTime(*slot)))
                .collect::<Vec<_>>()
        })
        .fold(OutboundMessage::new(MessageKind::Prompt, text), OutboundMessage::with_row)
        .with_button(button("No specific time", &Command::CalendarNoTime))
        .with_row(back_cancel_row())
}

/// Human-readable interval.
#[must_use]
pub fn interval_label(minutes: u32) -> String {
    let span = Duration::minutes(i64::from(minutes));
    let days = span.num_days();
    let hours = span.num_hours();
    if days > 0 && Duration::days(days) == span {
        format!("{days} d")
    } else if hours > 0 && Duration::hours(hours) == span {
        format!("{hours} h")
    } else {
        format!("{minutes} min")
    }
}

/// Reminder interval menu.
#[must_use]
pub fn interval_menu(choices: &[u32]) -> OutboundMessage {
    choices
        .chunks(3)
        .map(|row| {
            row.iter()
                .filter_map(|minutes| {
                    NotificationInterval::from_minutes(*minutes)
                        .ok()
                        .map(|interval| button(interval_label(*minutes), &Command::Interval(interval)))
                })
                .collect::<Vec<_>>()
        })
        .fold(
            OutboundMessage::new(MessageKind::Prompt, "How often should the assignee be reminded?"),
            OutboundMessage::with_row,
        )
        .with_button(button("No reminders", &Command::NoInterval))
        .with_row(back_cancel_row())
}

/// Assignee kind menu.
#[must_use]
pub fn assignee_menu() -> OutboundMessage {
    OutboundMessage::new(MessageKind::Prompt, "Who is responsible?")
        .with_button(button("🙋 Me", &Command::AssignSelf))
        .with_row(vec![
            button("👤 A user", &Command::AssignUserMenu),
            button("👥 A role", &Command::AssignRoleMenu),
        ])
        .with_row(back_cancel_row())
}

/// Page of the user picker. Out-of-range pages show the last page.
#[must_use]
pub fn user_picker(users: &[User], page: usize, page_size: usize) -> OutboundMessage {
    let size = page_size.max(1);
    let pages = users.len().div_ceil(size).max(1);
    let current = page.min(pages.saturating_sub(1));
    let message = users
        .iter()
        .skip(current.saturating_mul(size))
        .take(size)
        .fold(
            OutboundMessage::new(MessageKind::Prompt, "Pick a user"),
            |message, user| {
                message.with_button(button(user.display_name(), &Command::AssignUser(user.id().clone())))
            },
        );
    let mut navigation = Vec::new();
    if current > 0 {
        navigation.push(button("‹", &Command::AssigneePage(current.saturating_sub(1))));
    }
    if pages > 1 {
        navigation.push(button(
            format!("{}/{pages}", current.saturating_add(1)),
            &Command::Noop,
        ));
    }
    if current.saturating_add(1) < pages {
        navigation.push(button("›", &Command::AssigneePage(current.saturating_add(1))));
    }
    message.with_row(navigation).with_row(back_cancel_row())
}

/// Role picker.
#[must_use]
pub fn role_picker(roles: &[Role]) -> OutboundMessage {
    let text = if roles.is_empty() {
        "No roles are defined yet."
    } else {
        "Pick a role"
    };
    roles
        .iter()
        .fold(OutboundMessage::new(MessageKind::Prompt, text), |message, role| {
            message.with_button(button(role.name(), &Command::AssignRole(role.id())))
        })
        .with_row(back_cancel_row())
}

/// "Are you sure?" gate of the creation wizard.
#[must_use]
pub fn cancel_gate() -> OutboundMessage {
    OutboundMessage::new(
        MessageKind::Prompt,
        "Discard this task? Everything entered so far will be lost.",
    )
    .with_row(vec![
        button("Yes, discard", &Command::CancelConfirm),
        button("No, continue", &Command::CancelDecline),
    ])
}

/// Report wizard prompt.
#[must_use]
pub fn report_prompt(task: &Task, attachments: usize, min_chars: usize) -> OutboundMessage {
    let mut text = format!(
        "Report on \"{}\": describe the result in at least {min_chars} characters, \
         or attach files and press \"Send report\".",
        task.title()
    );
    if attachments > 0 {
        text.push_str(&format!("\nAttached so far: {attachments}"));
    }
    OutboundMessage::new(MessageKind::Prompt, text)
        .with_button(button("📨 Send report", &Command::SendReport))
        .with_button(button("✖ Cancel", &Command::Cancel))
}
