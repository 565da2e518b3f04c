//! In-memory notifier that records every delivery attempt.

use crate::directory::domain::UserId;
use crate::notification::{
    domain::{MessageKind, OutboundMessage},
    ports::{Notifier, NotifierError, NotifierResult},
};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

/// Message accepted by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    /// Recipient.
    pub recipient: UserId,
    /// Delivered message.
    pub message: OutboundMessage,
}

#[derive(Debug, Default)]
struct RecordingState {
    sent: Vec<SentMessage>,
    failing: HashSet<UserId>,
    attempts: usize,
}

/// Notifier that stores messages instead of delivering them.
///
/// Recipients registered with [`RecordingNotifier::fail_for`] get a
/// [`NotifierError::Rejected`] and nothing is recorded for them.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    state: Arc<RwLock<RecordingState>>,
}

impl RecordingNotifier {
    /// Creates an empty notifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every delivery to `recipient` fail.
    pub fn fail_for(&self, recipient: UserId) {
        if let Ok(mut state) = self.state.write() {
            state.failing.insert(recipient);
        }
    }

    /// Lets deliveries to `recipient` succeed again.
    pub fn recover(&self, recipient: &UserId) {
        if let Ok(mut state) = self.state.write() {
            state.failing.remove(recipient);
        }
    }

    /// Returns every delivered message in send order.
    #[must_use]
    pub fn sent(&self) -> Vec<SentMessage> {
        self.state
            .read()
            .map(|state| state.sent.clone())
            .unwrap_or_default()
    }

    /// Returns messages delivered to `recipient`.
    #[must_use]
    pub fn sent_to(&self, recipient: &UserId) -> Vec<OutboundMessage> {
        self.sent()
            .into_iter()
            .filter(|sent| &sent.recipient == recipient)
            .map(|sent| sent.message)
            .collect()
    }

    /// Returns delivered messages of `kind`.
    #[must_use]
    pub fn sent_of_kind(&self, kind: MessageKind) -> Vec<SentMessage> {
        self.sent()
            .into_iter()
            .filter(|sent| sent.message.kind() == kind)
            .collect()
    }

    /// Returns the number of delivery attempts, failed ones included.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.state.read().map(|state| state.attempts).unwrap_or_default()
    }

    /// Forgets every recorded message.
    pub fn clear(&self) {
        if let Ok(mut state) = self.state.write() {
            state.sent.clear();
            state.attempts = 0;
        }
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, recipient: &UserId, message: &OutboundMessage) -> NotifierResult<()> {
        let mut state = self.state.write().map_err(|err| NotifierError::Rejected {
            recipient: recipient.clone(),
            reason: err.to_string(),
        })?;
        state.attempts += 1;
        if state.failing.contains(recipient) {
            return Err(NotifierError::Rejected {
                recipient: recipient.clone(),
                reason: "recipient configured to fail".to_owned(),
            });
        }
        state.sent.push(SentMessage {
            recipient: recipient.clone(),
            message: message.clone(),
        });
        Ok(())
    }
}
