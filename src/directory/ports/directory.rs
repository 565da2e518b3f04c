//! Repository port for users and role memberships.

use crate::directory::domain::{Role, RoleId, User, UserId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for directory operations.
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Persistence contract for users and roles.
///
/// Role administration happens outside this crate; the role operations here
/// exist so that deployments and tests can seed the directory.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Finds a user by identity.
    ///
    /// Returns `None` when the user has not registered yet.
    async fn find_user(&self, id: &UserId) -> DirectoryResult<Option<User>>;

    /// Stores a newly registered user.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::DuplicateUser`] when the identity exists.
    async fn store_user(&self, user: &User) -> DirectoryResult<()>;

    /// Persists profile changes of an existing user.
    ///
    /// Role memberships are not changed by this call.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::UserNotFound`] when the user does not exist.
    async fn update_user(&self, user: &User) -> DirectoryResult<()>;

    /// Lists all registered users ordered by display name, then identity.
    async fn list_users(&self) -> DirectoryResult<Vec<User>>;

    /// Stores a role definition, replacing an existing one with the same id.
    async fn store_role(&self, role: &Role) -> DirectoryResult<()>;

    /// Finds a role by identifier.
    async fn find_role(&self, id: RoleId) -> DirectoryResult<Option<Role>>;

    /// Lists all roles ordered by name.
    async fn list_roles(&self) -> DirectoryResult<Vec<Role>>;

    /// Adds `user` to `role`. Adding an existing membership is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::UserNotFound`] or
    /// [`DirectoryError::RoleNotFound`] when either side is missing.
    async fn assign_role(&self, user: &UserId, role: RoleId) -> DirectoryResult<()>;

    /// Lists the members of a role ordered by display name, then identity.
    async fn role_members(&self, role: RoleId) -> DirectoryResult<Vec<User>>;
}

/// Errors returned by directory implementations.
#[derive(Debug, Clone, Error)]
pub enum DirectoryError {
    /// A user with the same identity already exists.
    #[error("duplicate user: {0}")]
    DuplicateUser(UserId),

    /// The user was not found.
    #[error("user not found: {0}")]
    UserNotFound(UserId),

    /// The role was not found.
    #[error("role not found: {0}")]
    RoleNotFound(RoleId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl DirectoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

/// Sorts users the way directory listings present them.
pub(crate) fn sort_users(users: &mut [User]) {
    users.sort_by(|left, right| {
        left.display_name()
            .cmp(&right.display_name())
            .then_with(|| left.id().cmp(right.id()))
    });
}
