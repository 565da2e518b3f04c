//! Step definitions for the task review scenarios.

#[path = "../in_memory/helpers.rs"]
pub mod helpers;

pub mod given;
pub mod when;
pub mod world;
