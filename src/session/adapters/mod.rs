//! Session store adapters.

pub mod memory;
pub mod postgres;
