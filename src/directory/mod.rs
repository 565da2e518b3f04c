//! User and role directory.
//!
//! Users are registered on first contact through the conversation engine and
//! later edited through the profile wizard. Roles group users so that a task
//! can be assigned to a whole team. The module follows the same hexagonal
//! split as the other bounded contexts:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]

pub mod adapters;
pub mod domain;
pub mod ports;

#[cfg(test)]
mod tests;
