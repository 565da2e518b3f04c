//! Notifier port definition.

use crate::directory::domain::UserId;
use crate::notification::domain::OutboundMessage;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for notifier operations.
pub type NotifierResult<T> = Result<T, NotifierError>;

/// Sends messages to users through the chat transport.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers `message` to `recipient`.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError`] when the transport refuses or fails the
    /// delivery. Callers log the failure and carry on.
    async fn send(&self, recipient: &UserId, message: &OutboundMessage) -> NotifierResult<()>;
}

/// Errors returned by notifier implementations.
#[derive(Debug, Clone, Error)]
pub enum NotifierError {
    /// The transport refused delivery to this recipient.
    #[error("delivery to {recipient} rejected: {reason}")]
    Rejected {
        /// Intended recipient.
        recipient: UserId,
        /// Transport-supplied reason.
        reason: String,
    },

    /// Transport-layer failure.
    #[error("transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl NotifierError {
    /// Wraps a transport error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }
}
