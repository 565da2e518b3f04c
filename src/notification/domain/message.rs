//! Outbound message and inline button model.

use serde::{Deserialize, Serialize};

/// Semantic category of an outbound message.
///
/// The transport uses the kind to pick styling; tests use it to assert on
/// what was sent without matching rendered text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Neutral informational reply.
    Info,
    /// Main menu or another navigation screen.
    Menu,
    /// Wizard prompt awaiting input.
    Prompt,
    /// Task card or task list.
    TaskView,
    /// Input rejected; the wizard stays on the same step.
    ValidationError,
    /// The caller may not perform the action.
    PermissionDenied,
    /// The referenced entity no longer exists.
    NotFound,
    /// A task was assigned to the recipient.
    TaskAssigned,
    /// A report awaits the recipient's decision.
    ReviewRequested,
    /// A submitted report was accepted.
    TaskConfirmed,
    /// A submitted report was sent back.
    TaskRejected,
    /// A completed task was reopened.
    TaskReopened,
    /// A task was cancelled.
    TaskCancelled,
    /// Someone commented on a task.
    CommentPosted,
    /// Daily digest.
    Digest,
    /// Task due tomorrow.
    DueTomorrow,
    /// One-shot reminder ahead of a due date.
    DueSoon,
    /// Recurring per-task reminder.
    IntervalReminder,
}

/// Inline button carrying an encoded command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    /// Visible label.
    pub label: String,
    /// Command string sent back by the transport when pressed.
    pub command: String,
}

impl Button {
    /// Creates a button.
    #[must_use]
    pub fn new(label: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            command: command.into(),
        }
    }
}

/// Message handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    kind: MessageKind,
    text: String,
    buttons: Vec<Vec<Button>>,
}

impl OutboundMessage {
    /// Creates a message without buttons.
    #[must_use]
    pub fn new(kind: MessageKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            buttons: Vec::new(),
        }
    }

    /// Appends a row of buttons. Empty rows are ignored.
    #[must_use]
    pub fn with_row(mut self, row: Vec<Button>) -> Self {
        if !row.is_empty() {
            self.buttons.push(row);
        }
        self
    }

    /// Appends a single-button row.
    #[must_use]
    pub fn with_button(self, button: Button) -> Self {
        self.with_row(vec![button])
    }

    /// Returns the message kind.
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Returns the message text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the button grid.
    #[must_use]
    pub fn buttons(&self) -> &[Vec<Button>] {
        &self.buttons
    }

    /// Iterates over every button command in grid order.
    pub fn commands(&self) -> impl Iterator<Item = &str> {
        self.buttons
            .iter()
            .flatten()
            .map(|button| button.command.as_str())
    }
}
