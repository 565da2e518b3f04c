//! Outbound notification boundary.
//!
//! Every component that talks to users goes through the [`ports::Notifier`]
//! port. Delivery is fire-and-forget: failures are logged and counted, never
//! propagated into the state change that triggered them.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
