//! Notifier that writes messages to the tracing log.

use crate::directory::domain::UserId;
use crate::notification::{
    domain::OutboundMessage,
    ports::{Notifier, NotifierResult},
};
use async_trait::async_trait;
use tracing::info;

/// Notifier used when no chat transport is attached.
///
/// Every message is logged at `info` and reported as delivered.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn send(&self, recipient: &UserId, message: &OutboundMessage) -> NotifierResult<()> {
        info!(
            user_id = %recipient,
            kind = ?message.kind(),
            buttons = message.commands().count(),
            text = message.text(),
            "outbound message"
        );
        Ok(())
    }
}
