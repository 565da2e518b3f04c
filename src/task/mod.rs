//! Delegated tasks: creation, review, and the audit trail.
//!
//! A task is created by one user and assigned either to a single user or to
//! a role. Assignees submit a report for review; the creator confirms or
//! rejects it. Subtasks gate submission, and every mutation appends a
//! history entry in the same transaction. The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
