//! In-memory user directory for tests and single-process deployments.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::directory::{
    domain::{Role, RoleId, User, UserId},
    ports::{DirectoryError, DirectoryResult, UserDirectory, directory::sort_users},
};

/// Thread-safe in-memory directory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    state: Arc<RwLock<InMemoryDirectoryState>>,
}

#[derive(Debug, Default)]
struct InMemoryDirectoryState {
    users: HashMap<UserId, User>,
    roles: HashMap<RoleId, Role>,
}

impl InMemoryUserDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl ToString) -> DirectoryError {
    DirectoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_user(&self, id: &UserId) -> DirectoryResult<Option<User>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.users.get(id).cloned())
    }

    async fn store_user(&self, user: &User) -> DirectoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if state.users.contains_key(user.id()) {
            return Err(DirectoryError::DuplicateUser(user.id().clone()));
        }
        state.users.insert(user.id().clone(), user.clone());
        Ok(())
    }

    async fn update_user(&self, user: &User) -> DirectoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        let stored = state
            .users
            .get_mut(user.id())
            .ok_or_else(|| DirectoryError::UserNotFound(user.id().clone()))?;
        let mut updated = user.clone();
        updated.replace_roles(stored.roles().clone());
        *stored = updated;
        Ok(())
    }

    async fn list_users(&self) -> DirectoryResult<Vec<User>> {
        let state = self.state.read().map_err(lock_error)?;
        let mut users: Vec<User> = state.users.values().cloned().collect();
        sort_users(&mut users);
        Ok(users)
    }

    async fn store_role(&self, role: &Role) -> DirectoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.roles.insert(role.id(), role.clone());
        Ok(())
    }

    async fn find_role(&self, id: RoleId) -> DirectoryResult<Option<Role>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.roles.get(&id).cloned())
    }

    async fn list_roles(&self) -> DirectoryResult<Vec<Role>> {
        let state = self.state.read().map_err(lock_error)?;
        let mut roles: Vec<Role> = state.roles.values().cloned().collect();
        roles.sort_by(|left, right| left.name().cmp(right.name()));
        Ok(roles)
    }

    async fn assign_role(&self, user: &UserId, role: RoleId) -> DirectoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if !state.roles.contains_key(&role) {
            return Err(DirectoryError::RoleNotFound(role));
        }
        let stored = state
            .users
            .get_mut(user)
            .ok_or_else(|| DirectoryError::UserNotFound(user.clone()))?;
        stored.add_role(role);
        Ok(())
    }

    async fn role_members(&self, role: RoleId) -> DirectoryResult<Vec<User>> {
        let state = self.state.read().map_err(lock_error)?;
        if !state.roles.contains_key(&role) {
            return Err(DirectoryError::RoleNotFound(role));
        }
        let mut members: Vec<User> = state
            .users
            .values()
            .filter(|user| user.is_member_of(role))
            .cloned()
            .collect();
        sort_users(&mut members);
        Ok(members)
    }
}
