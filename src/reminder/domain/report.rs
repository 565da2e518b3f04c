//! Per-sweep delivery counters.

use std::fmt;
use std::ops::AddAssign;

/// Outcome of one scheduled delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The notifier accepted the message.
    Delivered,
    /// The recipient is outside working hours.
    Deferred,
    /// The notifier failed.
    Failed,
    /// Nothing to send.
    Skipped,
}

/// Counts produced by one scheduler sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Messages delivered.
    pub delivered: usize,
    /// Recipients outside their working hours, left for a later sweep.
    pub deferred: usize,
    /// Deliveries that failed.
    pub failed: usize,
    /// Candidates that needed nothing this time.
    pub skipped: usize,
    /// Records removed by the sweep, such as expired sessions.
    pub cleared: usize,
}

impl SweepReport {
    /// Report of a single candidate with the given outcome.
    #[must_use]
    pub const fn single(outcome: Delivery) -> Self {
        let mut report = Self {
            delivered: 0,
            deferred: 0,
            failed: 0,
            skipped: 0,
            cleared: 0,
        };
        match outcome {
            Delivery::Delivered => report.delivered = 1,
            Delivery::Deferred => report.deferred = 1,
            Delivery::Failed => report.failed = 1,
            Delivery::Skipped => report.skipped = 1,
        }
        report
    }

    /// Returns `true` when nothing was attempted, deferred, or removed.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.delivered == 0 && self.deferred == 0 && self.failed == 0 && self.cleared == 0
    }
}

impl AddAssign for SweepReport {
    fn add_assign(&mut self, other: Self) {
        self.delivered = self.delivered.saturating_add(other.delivered);
        self.deferred = self.deferred.saturating_add(other.deferred);
        self.failed = self.failed.saturating_add(other.failed);
        self.skipped = self.skipped.saturating_add(other.skipped);
        self.cleared = self.cleared.saturating_add(other.cleared);
    }
}

impl fmt::Display for SweepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "delivered={} deferred={} failed={} skipped={} cleared={}",
            self.delivered, self.deferred, self.failed, self.skipped, self.cleared
        )
    }
}
