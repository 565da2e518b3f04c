//! Adapter implementations for the directory ports.

pub mod memory;
pub mod postgres;
