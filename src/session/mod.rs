//! Per-user conversation state.
//!
//! A [`domain::Session`] exists only while its user is inside a wizard;
//! absence means idle. The state tag ([`domain::WizardStep`]) selects which
//! [`domain::SessionPayload`] variant is valid, so a session can always be
//! resumed at the exact step it was saved in.

pub mod adapters;
pub mod domain;
pub mod ports;
