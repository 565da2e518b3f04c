//! Fan-out delivery with per-recipient failure isolation.

use crate::directory::domain::UserId;
use crate::notification::{domain::OutboundMessage, ports::Notifier};
use tracing::{debug, warn};

/// Outcome of a fan-out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Recipients that received the message.
    pub delivered: Vec<UserId>,
    /// Recipients whose delivery failed.
    pub failed: Vec<UserId>,
}

impl DeliveryReport {
    /// Returns `true` when at least one delivery succeeded and none failed.
    #[must_use]
    pub fn fully_delivered(&self) -> bool {
        !self.delivered.is_empty() && self.failed.is_empty()
    }

    /// Number of delivery attempts.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.delivered.len().saturating_add(self.failed.len())
    }
}

/// Sends `message` to each recipient in order.
///
/// Failures are logged at `warn` and recorded; they never abort the
/// remaining deliveries.
pub async fn dispatch<N>(
    notifier: &N,
    recipients: impl IntoIterator<Item = UserId>,
    message: &OutboundMessage,
) -> DeliveryReport
where
    N: Notifier + ?Sized,
{
    let mut report = DeliveryReport::default();
    for recipient in recipients {
        match notifier.send(&recipient, message).await {
            Ok(()) => {
                debug!(user_id = %recipient, kind = ?message.kind(), "notification delivered");
                report.delivered.push(recipient);
            }
            Err(error) => {
                warn!(user_id = %recipient, kind = ?message.kind(), %error, "notification failed");
                report.failed.push(recipient);
            }
        }
    }
    report
}
