//! Errors raised by reminder sweeps.

use crate::directory::ports::DirectoryError;
use crate::session::ports::SessionStoreError;
use crate::task::ports::TaskRepositoryError;
use thiserror::Error;

/// Failure that aborts a whole sweep.
///
/// Failures for a single recipient or task are counted in the sweep report
/// instead.
#[derive(Debug, Error)]
pub enum ReminderError {
    /// Task storage failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),

    /// User directory failed.
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// Session storage failed.
    #[error(transparent)]
    Session(#[from] SessionStoreError),
}

/// Result type for reminder sweeps.
pub type ReminderResult<T> = Result<T, ReminderError>;
