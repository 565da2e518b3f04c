//! Error types for directory validation.

use thiserror::Error;

/// Errors returned while constructing directory values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DirectoryDomainError {
    /// The user identifier is empty after trimming.
    #[error("user identifier must not be empty")]
    EmptyUserId,

    /// The role identifier is not a positive integer.
    #[error("invalid role identifier {0}, expected a positive integer")]
    InvalidRoleId(i64),

    /// The role name is empty after trimming.
    #[error("role name must not be empty")]
    EmptyRoleName,

    /// The timezone is not a known IANA zone name.
    #[error("unknown timezone '{0}'")]
    UnknownTimezone(String),

    /// The working-hours window is out of range or empty.
    #[error("invalid working hours {start}-{end}, expected 0 <= start < end <= 24")]
    InvalidWorkHours {
        /// Requested first working hour.
        start: u8,
        /// Requested end of the working window (exclusive).
        end: u8,
    },

    /// A person name is empty after trimming.
    #[error("name must not be empty")]
    EmptyName,
}
