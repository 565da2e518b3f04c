//! Text templates for notifications, rendered with `minijinja`.

use crate::notification::domain::{MessageKind, OutboundMessage};
use minijinja::Environment;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Notification templates known to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Template {
    /// A task was assigned to the recipient.
    TaskAssigned,
    /// A report awaits review.
    ReviewRequested,
    /// A report was accepted.
    TaskConfirmed,
    /// A report was sent back.
    TaskRejected,
    /// A completed task was reopened.
    TaskReopened,
    /// A task was cancelled.
    TaskCancelled,
    /// A comment was posted.
    CommentPosted,
    /// Daily digest.
    Digest,
    /// Task due tomorrow.
    DueTomorrow,
    /// Task due within the lead time.
    DueSoon,
    /// Recurring reminder.
    IntervalReminder,
}

impl Template {
    /// Returns the template name used in errors and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::TaskAssigned => "task_assigned",
            Self::ReviewRequested => "review_requested",
            Self::TaskConfirmed => "task_confirmed",
            Self::TaskRejected => "task_rejected",
            Self::TaskReopened => "task_reopened",
            Self::TaskCancelled => "task_cancelled",
            Self::CommentPosted => "comment_posted",
            Self::Digest => "digest",
            Self::DueTomorrow => "due_tomorrow",
            Self::DueSoon => "due_soon",
            Self::IntervalReminder => "interval_reminder",
        }
    }

    /// Message kind produced by this template.
    #[must_use]
    pub const fn kind(self) -> MessageKind {
        match self {
            Self::TaskAssigned => MessageKind::TaskAssigned,
            Self::ReviewRequested => MessageKind::ReviewRequested,
            Self::TaskConfirmed => MessageKind::TaskConfirmed,
            Self::TaskRejected => MessageKind::TaskRejected,
            Self::TaskReopened => MessageKind::TaskReopened,
            Self::TaskCancelled => MessageKind::TaskCancelled,
            Self::CommentPosted => MessageKind::CommentPosted,
            Self::Digest => MessageKind::Digest,
            Self::DueTomorrow => MessageKind::DueTomorrow,
            Self::DueSoon => MessageKind::DueSoon,
            Self::IntervalReminder => MessageKind::IntervalReminder,
        }
    }

    const fn source(self) -> &'static str {
        match self {
            Self::TaskAssigned => {
                "New task for you: \"{{ title }}\"\nFrom: {{ creator }}\
                 {% if due %}\nDue: {{ due }}{% endif %}\
                 {% if progress %}\nSubtasks: {{ progress }}{% endif %}"
            }
            Self::ReviewRequested => {
                "{{ actor }} finished \"{{ title }}\" and is waiting for your review.\
                 {% if report %}\nReport: {{ report }}{% endif %}\
                 {% if attachments %}\nAttachments: {{ attachments }}{% endif %}"
            }
            Self::TaskConfirmed => "\"{{ title }}\" was accepted by {{ actor }}.",
            Self::TaskRejected => {
                "\"{{ title }}\" needs rework. {{ actor }} sent the report back."
            }
            Self::TaskReopened => "\"{{ title }}\" was reopened by {{ actor }}.",
            Self::TaskCancelled => "\"{{ title }}\" was cancelled by {{ actor }}.",
            Self::CommentPosted => "{{ author }} commented on \"{{ title }}\":\n{{ text }}",
            Self::Digest => {
                "Good morning, {{ name }}!\nActive tasks: {{ active }}\n\
                 Overdue: {{ overdue }}\nDue this week: {{ due_this_week }}"
            }
            Self::DueTomorrow => "Reminder: \"{{ title }}\" is due tomorrow at {{ due }}.",
            Self::DueSoon => "\"{{ title }}\" is due soon: {{ due }}.",
            Self::IntervalReminder => {
                "Reminder: \"{{ title }}\"\
                 {% if due_today %} is due today at {{ due }}.\
                 {% elif due %} is due {{ due }}.\
                 {% else %} is still open.{% endif %}\
                 {% if progress %}\nSubtasks: {{ progress }}{% endif %}"
            }
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Template rendering failure.
#[derive(Debug, Error)]
#[error("failed to render template {template}: {reason}")]
pub struct RenderError {
    /// Template that failed.
    pub template: Template,
    /// Underlying error text.
    pub reason: String,
}

/// Renders notification templates into outbound messages.
#[derive(Clone)]
pub struct MessageRenderer {
    environment: Environment<'static>,
}

impl fmt::Debug for MessageRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageRenderer").finish_non_exhaustive()
    }
}

impl Default for MessageRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageRenderer {
    /// Creates a renderer with the built-in templates.
    #[must_use]
    pub fn new() -> Self {
        Self {
            environment: Environment::new(),
        }
    }

    /// Renders `template` with `context` into a message of the template's
    /// kind.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] when the context cannot be serialised or the
    /// template fails to evaluate.
    pub fn render<S: Serialize>(
        &self,
        template: Template,
        context: S,
    ) -> Result<OutboundMessage, RenderError> {
        let text = self
            .environment
            .render_str(template.source(), context)
            .map_err(|error| RenderError {
                template,
                reason: error.to_string(),
            })?;
        Ok(OutboundMessage::new(template.kind(), text))
    }
}
