//! Resolution of responsible parties for a task.

use crate::directory::{
    domain::{User, UserId},
    ports::{DirectoryResult, UserDirectory},
};
use crate::task::{
    domain::{Assignment, Task},
    ports::repository::is_responsible,
};
use std::sync::Arc;

/// Answers who is responsible for a task.
#[derive(Debug)]
pub struct AssignmentResolver<D>
where
    D: UserDirectory,
{
    directory: Arc<D>,
}

impl<D> Clone for AssignmentResolver<D>
where
    D: UserDirectory,
{
    fn clone(&self) -> Self {
        Self {
            directory: Arc::clone(&self.directory),
        }
    }
}

impl<D> AssignmentResolver<D>
where
    D: UserDirectory,
{
    /// Creates a resolver over `directory`.
    #[must_use]
    pub const fn new(directory: Arc<D>) -> Self {
        Self { directory }
    }

    /// Returns the responsible parties of `task`.
    ///
    /// A direct assignment yields the assignee; a role assignment yields
    /// every current member, which may be nobody.
    ///
    /// # Errors
    ///
    /// Returns the directory error when role membership cannot be read.
    pub async fn responsible_parties(&self, task: &Task) -> DirectoryResult<Vec<UserId>> {
        match task.assignment() {
            Assignment::User(user) => Ok(vec![user.clone()]),
            Assignment::Role(role) => Ok(self
                .directory
                .role_members(*role)
                .await?
                .into_iter()
                .map(|member| member.id().clone())
                .collect()),
        }
    }

    /// Returns the responsible parties of `task` minus `excluded`.
    ///
    /// # Errors
    ///
    /// Returns the directory error when role membership cannot be read.
    pub async fn responsible_except(
        &self,
        task: &Task,
        excluded: &[&UserId],
    ) -> DirectoryResult<Vec<UserId>> {
        let parties = self.responsible_parties(task).await?;
        Ok(parties
            .into_iter()
            .filter(|party| !excluded.contains(&party))
            .collect())
    }
}

/// Returns `true` when `user` created `task`, is its assignee, or belongs to
/// its assigned role.
#[must_use]
pub fn has_access(task: &Task, user: &User) -> bool {
    task.creator() == user.id() || is_responsible(task, user.id(), user.roles())
}
