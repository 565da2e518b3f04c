//! Session storage port.

mod store;

pub use store::{SessionStore, SessionStoreError, SessionStoreResult};
