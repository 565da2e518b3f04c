//! Brigade: chat-driven task tracking for small teams.
//!
//! Users create tasks through conversational wizards, assign them to a
//! colleague or a role, and move them through a review lifecycle
//! (active, pending review, completed, cancelled). A background scheduler
//! sends daily digests, due-date reminders, and per-task interval
//! reminders within each recipient's working hours.
//!
//! # Architecture
//!
//! Each bounded context follows hexagonal principles:
//!
//! - **Domain**: pure business rules with no infrastructure dependencies
//! - **Ports**: async trait interfaces for storage and delivery
//! - **Adapters**: in-memory and `PostgreSQL` implementations of the ports
//! - **Services**: orchestration over the ports
//!
//! # Modules
//!
//! - [`directory`]: users, roles, working hours, and timezones
//! - [`task`]: the task aggregate, access rules, and lifecycle service
//! - [`session`]: persisted wizard state
//! - [`notification`]: outbound messages, templates, and notifiers
//! - [`conversation`]: the engine that turns chat events into replies
//! - [`reminder`]: scheduled digests and reminders
//! - [`config`] and [`telemetry`]: configuration and logging setup

pub mod clock;
pub mod config;
pub mod conversation;
pub mod directory;
pub mod notification;
pub mod reminder;
pub mod session;
pub mod task;
pub mod telemetry;

#[cfg(test)]
mod test_support;
