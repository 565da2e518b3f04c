//! Engine errors and user-facing input refusals.

use super::calendar::CalendarError;
use crate::directory::domain::DirectoryDomainError;
use crate::directory::ports::DirectoryError;
use crate::session::domain::SessionDomainError;
use crate::session::ports::SessionStoreError;
use crate::task::services::TaskLifecycleError;
use thiserror::Error;

/// Input refused at the current wizard step.
///
/// The step is not advanced and the session is left unchanged.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InputError {
    /// The task title is too short.
    #[error("the title must be at least {min} characters long")]
    TitleTooShort {
        /// Minimum number of characters.
        min: usize,
    },

    /// A first or last name is too short.
    #[error("the name must be at least {min} characters long")]
    NameTooShort {
        /// Minimum number of characters.
        min: usize,
    },

    /// The step expects text.
    #[error("please answer with a text message")]
    TextExpected,

    /// The step expects a file.
    #[error("please send a photo, document, video, or audio file")]
    MediaExpected,

    /// The step expects a button press.
    #[error("please use the buttons below")]
    ChoiceExpected,

    /// The interval is not on the menu.
    #[error("{0} minutes is not one of the offered intervals")]
    UnknownInterval(u32),

    /// A calendar choice was refused.
    #[error(transparent)]
    Calendar(#[from] CalendarError),

    /// A profile value was refused.
    #[error(transparent)]
    Profile(#[from] DirectoryDomainError),
}

/// Failure the transport has to deal with.
///
/// Only infrastructure problems end up here. Refusals the user can act on
/// are turned into replies instead.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The session store failed.
    #[error(transparent)]
    Session(#[from] SessionStoreError),

    /// The user directory failed.
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// Task storage failed underneath the lifecycle service.
    #[error(transparent)]
    Lifecycle(#[from] TaskLifecycleError),

    /// The engine built a session that does not fit its step.
    #[error(transparent)]
    State(#[from] SessionDomainError),
}

/// Result type of engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
