//! Inbound events delivered by the transport.

use super::command::{Command, CommandError};
use crate::directory::domain::UserId;
use crate::task::domain::BlobRef;

/// One inbound event, already attributed to a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// Free text, media, or both.
    Message {
        /// Sender.
        user: UserId,
        /// Message text or media caption.
        text: Option<String>,
        /// Attached file.
        media: Option<BlobRef>,
    },
    /// Inline button press.
    ButtonPress {
        /// Sender.
        user: UserId,
        /// Decoded command.
        command: Command,
    },
}

impl InboundEvent {
    /// Text message.
    #[must_use]
    pub fn text(user: UserId, text: impl Into<String>) -> Self {
        Self::Message {
            user,
            text: Some(text.into()),
            media: None,
        }
    }

    /// Media message without a caption.
    #[must_use]
    pub const fn media(user: UserId, media: BlobRef) -> Self {
        Self::Message {
            user,
            text: None,
            media: Some(media),
        }
    }

    /// Button press.
    #[must_use]
    pub const fn button(user: UserId, command: Command) -> Self {
        Self::ButtonPress { user, command }
    }

    /// Builds an event from raw transport fields.
    ///
    /// A button string wins over text. Typed slash commands such as `/start`
    /// become the equivalent button press.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] when the button string does not decode.
    pub fn from_raw(
        user: UserId,
        text: Option<String>,
        command: Option<&str>,
        media: Option<BlobRef>,
    ) -> Result<Self, CommandError> {
        if let Some(raw) = command {
            return Ok(Self::ButtonPress {
                user,
                command: Command::decode(raw)?,
            });
        }
        let slash = text.as_deref().and_then(Command::from_slash);
        Ok(match slash {
            Some(decoded) if media.is_none() => Self::ButtonPress {
                user,
                command: decoded,
            },
            _ => Self::Message { user, text, media },
        })
    }

    /// Returns the sender.
    #[must_use]
    pub const fn user(&self) -> &UserId {
        match self {
            Self::Message { user, .. } | Self::ButtonPress { user, .. } => user,
        }
    }

    /// Returns the command of a button press.
    #[must_use]
    pub const fn command(&self) -> Option<&Command> {
        match self {
            Self::ButtonPress { command, .. } => Some(command),
            Self::Message { .. } => None,
        }
    }

    /// Returns the trimmed, non-empty text of a message.
    #[must_use]
    pub fn message_text(&self) -> Option<&str> {
        match self {
            Self::Message { text, .. } => text
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty()),
            Self::ButtonPress { .. } => None,
        }
    }

    /// Returns the attached file of a message.
    #[must_use]
    pub const fn message_media(&self) -> Option<&BlobRef> {
        match self {
            Self::Message { media, .. } => media.as_ref(),
            Self::ButtonPress { .. } => None,
        }
    }
}
