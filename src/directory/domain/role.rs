//! Role-groups that tasks can be assigned to.

use super::{DirectoryDomainError, RoleId};
use serde::{Deserialize, Serialize};

/// A named group of users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    id: RoleId,
    name: String,
    description: String,
}

impl Role {
    /// Creates a validated role.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryDomainError::EmptyRoleName`] when the name is blank.
    pub fn new(
        id: RoleId,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, DirectoryDomainError> {
        let raw_name = name.into();
        let trimmed = raw_name.trim();
        if trimmed.is_empty() {
            return Err(DirectoryDomainError::EmptyRoleName);
        }
        Ok(Self {
            id,
            name: trimmed.to_owned(),
            description: description.into(),
        })
    }

    /// Returns the role identifier.
    #[must_use]
    pub const fn id(&self) -> RoleId {
        self.id
    }

    /// Returns the role name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the role description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}
