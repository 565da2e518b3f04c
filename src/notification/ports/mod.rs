//! Port for delivering messages to users.

mod notifier;

pub use notifier::{Notifier, NotifierError, NotifierResult};
